use glam::Vec3;
use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::read_enum;

/// Spring-loaded six degree of freedom constraint between two rigid bodies
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Joint {
    pub name: String,
    pub name_en: String,
    pub body_a: Option<u32>,
    pub body_b: Option<u32>,
    /// Pivot in model space
    pub position: Vec3,
    /// Euler rotation in radians
    pub rotation: Vec3,
    pub linear_lower: Vec3,
    pub linear_upper: Vec3,
    /// Angle limits in radians
    pub angular_lower: Vec3,
    pub angular_upper: Vec3,
    pub spring_linear: Vec3,
    pub spring_angular: Vec3,
}

impl Joint {
    pub fn has_spring(&self) -> bool {
        self.spring_linear != Vec3::ZERO || self.spring_angular != Vec3::ZERO
    }

    pub(crate) fn min_pmx_size(globals: &PmxGlobals) -> usize {
        8 + 1 + 2 * globals.rigid_body_index.bytes() + 12 * 8
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let name = reader.read_text(globals.encoding)?;
        let name_en = reader.read_text(globals.encoding)?;
        // Only the spring 6DOF kind exists in PMX 2.0
        read_enum(reader, "joint kind", |v| (v == 0).then_some(()))?;

        let mut joint = Self {
            name,
            name_en,
            body_a: reader.read_index(globals.rigid_body_index)?,
            body_b: reader.read_index(globals.rigid_body_index)?,
            ..Default::default()
        };
        Self::read_transform(reader, &mut joint)?;
        Ok(joint)
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        writer.write_text(&self.name, globals.encoding)?;
        writer.write_text(&self.name_en, globals.encoding)?;
        writer.write_u8(0)?;
        writer.write_index(self.body_a, globals.rigid_body_index)?;
        writer.write_index(self.body_b, globals.rigid_body_index)?;
        self.write_transform(writer)
    }

    /// Transform, limits and springs, shared by both model variants
    pub(crate) fn write_transform(&self, writer: &mut ByteWriter) -> Result<()> {
        for v in [
            self.position,
            self.rotation,
            self.linear_lower,
            self.linear_upper,
            self.angular_lower,
            self.angular_upper,
            self.spring_linear,
            self.spring_angular,
        ] {
            writer.write_vec3(v)?;
        }
        Ok(())
    }

    pub(crate) fn read_transform(reader: &mut ByteReader<'_>, joint: &mut Joint) -> Result<()> {
        joint.position = reader.read_vec3()?;
        joint.rotation = reader.read_vec3()?;
        joint.linear_lower = reader.read_vec3()?;
        joint.linear_upper = reader.read_vec3()?;
        joint.angular_lower = reader.read_vec3()?;
        joint.angular_upper = reader.read_vec3()?;
        joint.spring_linear = reader.read_vec3()?;
        joint.spring_angular = reader.read_vec3()?;
        Ok(())
    }
}
