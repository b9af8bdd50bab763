use glam::Vec3;
use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::read_enum;

/// Number of collision groups
pub const COLLISION_GROUPS: u8 = 16;

/// Collision volume shape types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum RigidShape {
    /// Radius in `size.x`
    #[default]
    Sphere = 0,
    /// Half extents in `size`
    Box = 1,
    /// Radius in `size.x`, height in `size.y`
    Capsule = 2,
}

impl RigidShape {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Sphere),
            1 => Some(Self::Box),
            2 => Some(Self::Capsule),
            _ => None,
        }
    }
}

/// How the rigid body is driven
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum PhysicsMode {
    /// Kinematic, follows its bone
    #[default]
    FollowBone = 0,
    /// Simulated, drives its bone
    Dynamic = 1,
    /// Simulated, bone keeps its animated position and takes the rotation
    DynamicAligned = 2,
}

impl PhysicsMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::FollowBone),
            1 => Some(Self::Dynamic),
            2 => Some(Self::DynamicAligned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBody {
    pub name: String,
    pub name_en: String,
    /// Bound bone, `None` for a free body
    pub bone: Option<u32>,
    /// Collision group in `0..16`
    pub group: u8,
    /// Bit `i` set means the body does not collide with group `i`
    pub non_collision_mask: u16,
    pub shape: RigidShape,
    pub size: Vec3,
    /// Position in model space
    pub position: Vec3,
    /// Euler rotation in radians
    pub rotation: Vec3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub mode: PhysicsMode,
}

impl RigidBody {
    /// Whether this body's mask excludes `group`
    pub fn ignores_group(&self, group: u8) -> bool {
        group < COLLISION_GROUPS && self.non_collision_mask & (1 << group) != 0
    }

    /// Whether the masks of either body exclude the other's group
    pub fn is_masked_against(&self, other: &RigidBody) -> bool {
        self.ignores_group(other.group) || other.ignores_group(self.group)
    }

    pub fn is_dynamic(&self) -> bool {
        self.mode != PhysicsMode::FollowBone
    }

    pub(crate) fn min_pmx_size(globals: &PmxGlobals) -> usize {
        8 + globals.bone_index.bytes() + 1 + 2 + 1 + 36 + 20 + 1
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let name = reader.read_text(globals.encoding)?;
        let name_en = reader.read_text(globals.encoding)?;
        let bone = reader.read_index(globals.bone_index)?;
        let group = read_enum(reader, "collision group", |v| {
            (v < COLLISION_GROUPS).then_some(v)
        })?;
        let non_collision_mask = reader.read_u16()?;
        let shape = read_enum(reader, "rigid body shape", RigidShape::from_u8)?;

        Ok(Self {
            name,
            name_en,
            bone,
            group,
            non_collision_mask,
            shape,
            size: reader.read_vec3()?,
            position: reader.read_vec3()?,
            rotation: reader.read_vec3()?,
            mass: reader.read_f32()?,
            linear_damping: reader.read_f32()?,
            angular_damping: reader.read_f32()?,
            restitution: reader.read_f32()?,
            friction: reader.read_f32()?,
            mode: read_enum(reader, "physics mode", PhysicsMode::from_u8)?,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        writer.write_text(&self.name, globals.encoding)?;
        writer.write_text(&self.name_en, globals.encoding)?;
        writer.write_index(self.bone, globals.bone_index)?;
        self.write_physics(writer)
    }

    /// Everything after the bone reference, shared by both model variants
    pub(crate) fn write_physics(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_u8(self.group)?;
        writer.write_u16(self.non_collision_mask)?;
        writer.write_u8(self.shape as u8)?;
        writer.write_vec3(self.size)?;
        writer.write_vec3(self.position)?;
        writer.write_vec3(self.rotation)?;
        writer.write_f32(self.mass)?;
        writer.write_f32(self.linear_damping)?;
        writer.write_f32(self.angular_damping)?;
        writer.write_f32(self.restitution)?;
        writer.write_f32(self.friction)?;
        writer.write_u8(self.mode as u8)?;
        Ok(())
    }
}
