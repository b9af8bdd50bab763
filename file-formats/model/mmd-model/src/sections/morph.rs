use glam::{Quat, Vec3, Vec4};
use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::{Section, read_enum, read_pmx_count, write_pmx_count};

/// Morph type tag as stored in PMX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum MorphKind {
    Group,
    Vertex,
    Bone,
    /// Base UV (channel 0) or additional UV channel 1..=4
    Uv(u8),
    Material,
}

impl MorphKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Group,
            1 => Self::Vertex,
            2 => Self::Bone,
            3..=7 => Self::Uv(value - 3),
            8 => Self::Material,
            _ => return None,
        })
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Self::Group => 0,
            Self::Vertex => 1,
            Self::Bone => 2,
            Self::Uv(channel) => 3 + channel.min(4),
            Self::Material => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupOffset {
    pub morph: Option<u32>,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexOffset {
    pub vertex: u32,
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneOffset {
    pub bone: Option<u32>,
    pub translation: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct UvOffset {
    pub vertex: u32,
    pub offset: Vec4,
}

/// Material parameter delta; `material == None` targets every material
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialOffset {
    pub material: Option<u32>,
    /// 0 multiplies, 1 adds
    pub operation: u8,
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture_tint: Vec4,
    pub sphere_tint: Vec4,
    pub toon_tint: Vec4,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum MorphOffsets {
    Group(Vec<GroupOffset>),
    Vertex(Vec<VertexOffset>),
    Bone(Vec<BoneOffset>),
    Uv { channel: u8, offsets: Vec<UvOffset> },
    Material(Vec<MaterialOffset>),
}

impl Default for MorphOffsets {
    fn default() -> Self {
        Self::Vertex(Vec::new())
    }
}

impl MorphOffsets {
    pub fn kind(&self) -> MorphKind {
        match self {
            Self::Group(_) => MorphKind::Group,
            Self::Vertex(_) => MorphKind::Vertex,
            Self::Bone(_) => MorphKind::Bone,
            Self::Uv { channel, .. } => MorphKind::Uv(*channel),
            Self::Material(_) => MorphKind::Material,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Group(v) => v.len(),
            Self::Vertex(v) => v.len(),
            Self::Bone(v) => v.len(),
            Self::Uv { offsets, .. } => offsets.len(),
            Self::Material(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Morph {
    pub name: String,
    pub name_en: String,
    /// Control panel slot (0 system, 1 eyebrow, 2 eye, 3 mouth, 4 other)
    pub panel: u8,
    pub offsets: MorphOffsets,
}

impl Morph {
    pub fn kind(&self) -> MorphKind {
        self.offsets.kind()
    }

    pub(crate) fn min_pmx_size() -> usize {
        8 + 1 + 1 + 4
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let name = reader.read_text(globals.encoding)?;
        let name_en = reader.read_text(globals.encoding)?;
        let panel = reader.read_u8()?;
        let kind = read_enum(reader, "morph kind", MorphKind::from_u8)?;

        let offsets = match kind {
            MorphKind::Group => {
                let count = read_pmx_count(reader, Section::Morphs, globals.morph_index.bytes() + 4)?;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(GroupOffset {
                        morph: reader.read_index(globals.morph_index)?,
                        weight: reader.read_f32()?,
                    });
                }
                MorphOffsets::Group(offsets)
            }
            MorphKind::Vertex => {
                let count =
                    read_pmx_count(reader, Section::Morphs, globals.vertex_index.bytes() + 12)?;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(VertexOffset {
                        vertex: reader.read_vertex_index(globals.vertex_index)?,
                        offset: reader.read_vec3()?,
                    });
                }
                MorphOffsets::Vertex(offsets)
            }
            MorphKind::Bone => {
                let count = read_pmx_count(reader, Section::Morphs, globals.bone_index.bytes() + 28)?;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(BoneOffset {
                        bone: reader.read_index(globals.bone_index)?,
                        translation: reader.read_vec3()?,
                        rotation: reader.read_quat()?,
                    });
                }
                MorphOffsets::Bone(offsets)
            }
            MorphKind::Uv(channel) => {
                let count =
                    read_pmx_count(reader, Section::Morphs, globals.vertex_index.bytes() + 16)?;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(UvOffset {
                        vertex: reader.read_vertex_index(globals.vertex_index)?,
                        offset: reader.read_vec4()?,
                    });
                }
                MorphOffsets::Uv { channel, offsets }
            }
            MorphKind::Material => {
                let count =
                    read_pmx_count(reader, Section::Morphs, globals.material_index.bytes() + 113)?;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    offsets.push(MaterialOffset {
                        material: reader.read_index(globals.material_index)?,
                        operation: reader.read_u8()?,
                        diffuse: reader.read_vec4()?,
                        specular: reader.read_vec3()?,
                        specular_power: reader.read_f32()?,
                        ambient: reader.read_vec3()?,
                        edge_color: reader.read_vec4()?,
                        edge_size: reader.read_f32()?,
                        texture_tint: reader.read_vec4()?,
                        sphere_tint: reader.read_vec4()?,
                        toon_tint: reader.read_vec4()?,
                    });
                }
                MorphOffsets::Material(offsets)
            }
        };

        log::trace!("Morph '{name}': {:?} with {} offset(s)", kind, offsets.len());

        Ok(Self {
            name,
            name_en,
            panel,
            offsets,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        writer.write_text(&self.name, globals.encoding)?;
        writer.write_text(&self.name_en, globals.encoding)?;
        writer.write_u8(self.panel)?;
        writer.write_u8(self.kind().to_u8())?;
        write_pmx_count(writer, self.offsets.len())?;

        match &self.offsets {
            MorphOffsets::Group(offsets) => {
                for o in offsets {
                    writer.write_index(o.morph, globals.morph_index)?;
                    writer.write_f32(o.weight)?;
                }
            }
            MorphOffsets::Vertex(offsets) => {
                for o in offsets {
                    writer.write_vertex_index(o.vertex, globals.vertex_index)?;
                    writer.write_vec3(o.offset)?;
                }
            }
            MorphOffsets::Bone(offsets) => {
                for o in offsets {
                    writer.write_index(o.bone, globals.bone_index)?;
                    writer.write_vec3(o.translation)?;
                    writer.write_quat(o.rotation)?;
                }
            }
            MorphOffsets::Uv { offsets, .. } => {
                for o in offsets {
                    writer.write_vertex_index(o.vertex, globals.vertex_index)?;
                    writer.write_vec4(o.offset)?;
                }
            }
            MorphOffsets::Material(offsets) => {
                for o in offsets {
                    writer.write_index(o.material, globals.material_index)?;
                    writer.write_u8(o.operation)?;
                    writer.write_vec4(o.diffuse)?;
                    writer.write_vec3(o.specular)?;
                    writer.write_f32(o.specular_power)?;
                    writer.write_vec3(o.ambient)?;
                    writer.write_vec4(o.edge_color)?;
                    writer.write_f32(o.edge_size)?;
                    writer.write_vec4(o.texture_tint)?;
                    writer.write_vec4(o.sphere_tint)?;
                    writer.write_vec4(o.toon_tint)?;
                }
            }
        }
        Ok(())
    }
}
