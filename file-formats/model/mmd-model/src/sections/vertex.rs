use glam::{Vec2, Vec3, Vec4};
use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::read_enum;

/// Bone influences of a vertex
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Skinning {
    Bdef1 {
        bone: Option<u32>,
    },
    /// Two bones, `weight` applies to the first and `1 - weight` to the second
    Bdef2 {
        bones: [Option<u32>; 2],
        weight: f32,
    },
    Bdef4 {
        bones: [Option<u32>; 4],
        weights: [f32; 4],
    },
    /// Spherical deform; blends like BDEF2 with an extra rotation centre
    Sdef {
        bones: [Option<u32>; 2],
        weight: f32,
        c: Vec3,
        r0: Vec3,
        r1: Vec3,
    },
}

impl Default for Skinning {
    fn default() -> Self {
        Self::Bdef1 { bone: Some(0) }
    }
}

impl Skinning {
    fn kind(&self) -> u8 {
        match self {
            Self::Bdef1 { .. } => 0,
            Self::Bdef2 { .. } => 1,
            Self::Bdef4 { .. } => 2,
            Self::Sdef { .. } => 3,
        }
    }

    /// Every bone slot, including empty ones
    pub fn bone_slots(&self) -> Vec<Option<u32>> {
        match self {
            Self::Bdef1 { bone } => vec![*bone],
            Self::Bdef2 { bones, .. } | Self::Sdef { bones, .. } => bones.to_vec(),
            Self::Bdef4 { bones, .. } => bones.to_vec(),
        }
    }

    /// Up to four `(bone, weight)` pairs with duplicates merged and the
    /// weights normalised to sum to 1
    pub fn influences(&self) -> Vec<(u32, f32)> {
        let raw: Vec<(Option<u32>, f32)> = match self {
            Self::Bdef1 { bone } => vec![(*bone, 1.0)],
            Self::Bdef2 { bones, weight } | Self::Sdef { bones, weight, .. } => {
                vec![(bones[0], *weight), (bones[1], 1.0 - *weight)]
            }
            Self::Bdef4 { bones, weights } => {
                bones.iter().copied().zip(weights.iter().copied()).collect()
            }
        };

        let mut merged: Vec<(u32, f32)> = Vec::with_capacity(4);
        for (bone, weight) in raw {
            let Some(bone) = bone else { continue };
            if weight <= 0.0 {
                continue;
            }
            match merged.iter_mut().find(|(b, _)| *b == bone) {
                Some(entry) => entry.1 += weight,
                None => merged.push((bone, weight)),
            }
        }

        let total: f32 = merged.iter().map(|(_, w)| w).sum();
        if total > 0.0 {
            for entry in &mut merged {
                entry.1 /= total;
            }
        }
        merged
    }

    /// Rewrite every bone slot through `map`
    pub fn remap_bones(&mut self, mut map: impl FnMut(Option<u32>) -> Option<u32>) {
        match self {
            Self::Bdef1 { bone } => *bone = map(*bone),
            Self::Bdef2 { bones, .. } | Self::Sdef { bones, .. } => {
                bones.iter_mut().for_each(|b| *b = map(*b));
            }
            Self::Bdef4 { bones, .. } => bones.iter_mut().for_each(|b| *b = map(*b)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub additional_uvs: Vec<Vec4>,
    pub skinning: Skinning,
    /// Edge (outline) thickness multiplier
    pub edge_scale: f32,
}

impl Vertex {
    /// Smallest encoded size of one vertex for the given globals
    pub(crate) fn min_pmx_size(globals: &PmxGlobals) -> usize {
        32 + 16 * globals.additional_uv as usize + 1 + globals.bone_index.bytes() + 4
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let position = reader.read_vec3()?;
        let normal = reader.read_vec3()?;
        let uv = reader.read_vec2()?;
        let additional_uvs = (0..globals.additional_uv)
            .map(|_| reader.read_vec4())
            .collect::<mmd_data::Result<Vec<_>>>()?;

        let kind = read_enum(reader, "vertex skinning", |v| (v <= 3).then_some(v))?;
        let bone = globals.bone_index;
        let skinning = match kind {
            0 => Skinning::Bdef1 {
                bone: reader.read_index(bone)?,
            },
            1 => Skinning::Bdef2 {
                bones: [reader.read_index(bone)?, reader.read_index(bone)?],
                weight: reader.read_f32()?,
            },
            2 => Skinning::Bdef4 {
                bones: [
                    reader.read_index(bone)?,
                    reader.read_index(bone)?,
                    reader.read_index(bone)?,
                    reader.read_index(bone)?,
                ],
                weights: [
                    reader.read_f32()?,
                    reader.read_f32()?,
                    reader.read_f32()?,
                    reader.read_f32()?,
                ],
            },
            _ => Skinning::Sdef {
                bones: [reader.read_index(bone)?, reader.read_index(bone)?],
                weight: reader.read_f32()?,
                c: reader.read_vec3()?,
                r0: reader.read_vec3()?,
                r1: reader.read_vec3()?,
            },
        };

        Ok(Self {
            position,
            normal,
            uv,
            additional_uvs,
            skinning,
            edge_scale: reader.read_f32()?,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        writer.write_vec3(self.position)?;
        writer.write_vec3(self.normal)?;
        writer.write_vec2(self.uv)?;
        for i in 0..globals.additional_uv as usize {
            writer.write_vec4(self.additional_uvs.get(i).copied().unwrap_or(Vec4::ZERO))?;
        }

        writer.write_u8(self.skinning.kind())?;
        let width = globals.bone_index;
        match &self.skinning {
            Skinning::Bdef1 { bone } => writer.write_index(*bone, width)?,
            Skinning::Bdef2 { bones, weight } => {
                writer.write_index(bones[0], width)?;
                writer.write_index(bones[1], width)?;
                writer.write_f32(*weight)?;
            }
            Skinning::Bdef4 { bones, weights } => {
                for bone in bones {
                    writer.write_index(*bone, width)?;
                }
                for weight in weights {
                    writer.write_f32(*weight)?;
                }
            }
            Skinning::Sdef {
                bones,
                weight,
                c,
                r0,
                r1,
            } => {
                writer.write_index(bones[0], width)?;
                writer.write_index(bones[1], width)?;
                writer.write_f32(*weight)?;
                writer.write_vec3(*c)?;
                writer.write_vec3(*r0)?;
                writer.write_vec3(*r1)?;
            }
        }

        writer.write_f32(self.edge_scale)?;
        Ok(())
    }
}
