use glam::{Vec3, Vec4};
use mmd_data::{ByteReader, ByteWriter};

use crate::error::{ModelError, Result};
use crate::header::PmxGlobals;

use super::read_enum;

bitflags::bitflags! {
    /// Material draw flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
    pub struct MaterialFlags: u8 {
        /// Disable back-face culling
        const DOUBLE_SIDED = 0x01;
        /// Cast a shadow onto the ground plane
        const GROUND_SHADOW = 0x02;
        /// Draw into the self-shadow map
        const SELF_SHADOW_MAP = 0x04;
        /// Receive self shadows
        const SELF_SHADOW = 0x08;
        /// Draw the outline edge
        const EDGE = 0x10;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum SphereMode {
    #[default]
    Disabled,
    Multiply,
    Add,
    SubTexture,
}

impl SphereMode {
    fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Self::Disabled,
            1 => Self::Multiply,
            2 => Self::Add,
            3 => Self::SubTexture,
            _ => return None,
        })
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::Multiply => 1,
            Self::Add => 2,
            Self::SubTexture => 3,
        }
    }
}

/// Toon ramp reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Toon {
    /// Model texture table entry
    Texture(Option<u32>),
    /// One of the ten shared toon ramps (`toon01.bmp` .. `toon10.bmp`)
    Shared(u8),
}

impl Default for Toon {
    fn default() -> Self {
        Self::Texture(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Material {
    pub name: String,
    pub name_en: String,
    /// RGB plus alpha
    pub diffuse: Vec4,
    pub specular: Vec3,
    pub specular_power: f32,
    pub ambient: Vec3,
    pub flags: MaterialFlags,
    pub edge_color: Vec4,
    pub edge_size: f32,
    pub texture: Option<u32>,
    pub sphere_texture: Option<u32>,
    pub sphere_mode: SphereMode,
    pub toon: Toon,
    pub memo: String,
    /// Number of face indices drawn with this material
    pub index_count: u32,
}

impl Material {
    pub fn is_double_sided(&self) -> bool {
        self.flags.contains(MaterialFlags::DOUBLE_SIDED)
    }

    pub fn has_edge(&self) -> bool {
        self.flags.contains(MaterialFlags::EDGE)
    }

    pub(crate) fn min_pmx_size(globals: &PmxGlobals) -> usize {
        8 + 16 + 12 + 4 + 12 + 1 + 16 + 4 + 2 * globals.texture_index.bytes() + 2 + 1 + 4 + 4
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let encoding = globals.encoding;
        let name = reader.read_text(encoding)?;
        let name_en = reader.read_text(encoding)?;
        let diffuse = reader.read_vec4()?;
        let specular = reader.read_vec3()?;
        let specular_power = reader.read_f32()?;
        let ambient = reader.read_vec3()?;
        let flags = MaterialFlags::from_bits_retain(reader.read_u8()?);
        let edge_color = reader.read_vec4()?;
        let edge_size = reader.read_f32()?;
        let texture = reader.read_index(globals.texture_index)?;
        let sphere_texture = reader.read_index(globals.texture_index)?;
        let sphere_mode = read_enum(reader, "sphere mode", SphereMode::from_u8)?;
        let shared = read_enum(reader, "shared toon flag", |v| (v <= 1).then_some(v == 1))?;
        let toon = if shared {
            Toon::Shared(reader.read_u8()?)
        } else {
            Toon::Texture(reader.read_index(globals.texture_index)?)
        };
        let memo = reader.read_text(encoding)?;

        let offset = reader.position();
        let count = reader.read_i32()?;
        let index_count = u32::try_from(count).map_err(|_| ModelError::InvalidValue {
            field: "material index count",
            value: count as u32,
            offset,
        })?;

        Ok(Self {
            name,
            name_en,
            diffuse,
            specular,
            specular_power,
            ambient,
            flags,
            edge_color,
            edge_size,
            texture,
            sphere_texture,
            sphere_mode,
            toon,
            memo,
            index_count,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        let encoding = globals.encoding;
        writer.write_text(&self.name, encoding)?;
        writer.write_text(&self.name_en, encoding)?;
        writer.write_vec4(self.diffuse)?;
        writer.write_vec3(self.specular)?;
        writer.write_f32(self.specular_power)?;
        writer.write_vec3(self.ambient)?;
        writer.write_u8(self.flags.bits())?;
        writer.write_vec4(self.edge_color)?;
        writer.write_f32(self.edge_size)?;
        writer.write_index(self.texture, globals.texture_index)?;
        writer.write_index(self.sphere_texture, globals.texture_index)?;
        writer.write_u8(self.sphere_mode.to_u8())?;
        match self.toon {
            Toon::Shared(index) => {
                writer.write_u8(1)?;
                writer.write_u8(index)?;
            }
            Toon::Texture(texture) => {
                writer.write_u8(0)?;
                writer.write_index(texture, globals.texture_index)?;
            }
        }
        writer.write_text(&self.memo, encoding)?;
        writer.write_i32(self.index_count as i32)?;
        Ok(())
    }
}
