use glam::Vec3;
use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::read_enum;

bitflags::bitflags! {
    /// Bone flags as defined in the PMX format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
    pub struct BoneFlags: u16 {
        /// Tail is given as a bone reference instead of an offset
        const TAIL_IS_BONE = 0x0001;
        const ROTATABLE = 0x0002;
        const TRANSLATABLE = 0x0004;
        const VISIBLE = 0x0008;
        /// User may pose the bone
        const CONTROLLABLE = 0x0010;
        const IK = 0x0020;
        /// Inherit from the parent's local transform instead of its pose delta
        const INHERIT_LOCAL = 0x0080;
        const INHERIT_ROTATION = 0x0100;
        const INHERIT_TRANSLATION = 0x0200;
        const FIXED_AXIS = 0x0400;
        const LOCAL_AXIS = 0x0800;
        /// Evaluate after the physics step
        const AFTER_PHYSICS = 0x1000;
        const EXTERNAL_PARENT = 0x2000;
    }
}

impl BoneFlags {
    /// Bits whose presence is implied by optional bone data
    const STRUCTURAL: Self = Self::TAIL_IS_BONE
        .union(Self::IK)
        .union(Self::INHERIT_ROTATION)
        .union(Self::INHERIT_TRANSLATION)
        .union(Self::FIXED_AXIS)
        .union(Self::LOCAL_AXIS)
        .union(Self::EXTERNAL_PARENT);
}

/// Where the bone's display tail points
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum BoneTail {
    Offset(Vec3),
    Bone(Option<u32>),
}

impl Default for BoneTail {
    fn default() -> Self {
        Self::Bone(None)
    }
}

/// Rotation and/or translation inherited from another bone
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct InheritLink {
    pub parent: Option<u32>,
    pub weight: f32,
    pub rotation: bool,
    pub translation: bool,
}

/// Local axis frame; the y axis is implied by `z × x`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalAxes {
    pub x: Vec3,
    pub z: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkLink {
    pub bone: Option<u32>,
    /// Lower and upper angle limits in radians
    pub limits: Option<(Vec3, Vec3)>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkChain {
    pub target: Option<u32>,
    pub loop_count: i32,
    /// Per-iteration rotation limit in radians
    pub limit_angle: f32,
    pub links: Vec<IkLink>,
}

/// PMD bone kind and link index, kept so PMD files re-encode unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PmdBoneExtra {
    pub kind: u8,
    pub link: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    pub name: String,
    pub name_en: String,
    /// Head position in model space
    pub position: Vec3,
    pub parent: Option<u32>,
    /// Deform layer; lower layers are evaluated first
    pub transform_order: i32,
    pub flags: BoneFlags,
    pub tail: BoneTail,
    pub inherit: Option<InheritLink>,
    pub fixed_axis: Option<Vec3>,
    pub local_axes: Option<LocalAxes>,
    pub external_parent: Option<i32>,
    pub ik: Option<IkChain>,
    pub pmd: Option<PmdBoneExtra>,
}

impl Bone {
    pub fn transform_after_dynamics(&self) -> bool {
        self.flags.contains(BoneFlags::AFTER_PHYSICS)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(BoneFlags::VISIBLE)
    }

    pub fn is_controllable(&self) -> bool {
        self.flags.contains(BoneFlags::CONTROLLABLE)
    }

    /// A bone with nothing to point its tail at
    pub fn is_tip(&self) -> bool {
        match self.tail {
            BoneTail::Bone(target) => target.is_none(),
            BoneTail::Offset(offset) => offset == Vec3::ZERO,
        }
    }

    /// Flags with the structural bits recomputed from the optional data
    pub fn effective_flags(&self) -> BoneFlags {
        let mut flags = self.flags.difference(BoneFlags::STRUCTURAL);
        flags.set(
            BoneFlags::TAIL_IS_BONE,
            matches!(self.tail, BoneTail::Bone(_)),
        );
        flags.set(BoneFlags::IK, self.ik.is_some());
        if let Some(link) = &self.inherit {
            flags.set(BoneFlags::INHERIT_ROTATION, link.rotation);
            flags.set(BoneFlags::INHERIT_TRANSLATION, link.translation);
            if !link.rotation && !link.translation {
                flags.insert(BoneFlags::INHERIT_ROTATION);
            }
        }
        flags.set(BoneFlags::FIXED_AXIS, self.fixed_axis.is_some());
        flags.set(BoneFlags::LOCAL_AXIS, self.local_axes.is_some());
        flags.set(BoneFlags::EXTERNAL_PARENT, self.external_parent.is_some());
        flags
    }

    pub(crate) fn min_pmx_size(globals: &PmxGlobals) -> usize {
        8 + 12 + globals.bone_index.bytes() + 4 + 2 + globals.bone_index.bytes()
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let width = globals.bone_index;
        let name = reader.read_text(globals.encoding)?;
        let name_en = reader.read_text(globals.encoding)?;
        let position = reader.read_vec3()?;
        let parent = reader.read_index(width)?;
        let transform_order = reader.read_i32()?;
        let flags = BoneFlags::from_bits_retain(reader.read_u16()?);

        let tail = if flags.contains(BoneFlags::TAIL_IS_BONE) {
            BoneTail::Bone(reader.read_index(width)?)
        } else {
            BoneTail::Offset(reader.read_vec3()?)
        };

        let inherit = if flags.intersects(BoneFlags::INHERIT_ROTATION | BoneFlags::INHERIT_TRANSLATION)
        {
            Some(InheritLink {
                parent: reader.read_index(width)?,
                weight: reader.read_f32()?,
                rotation: flags.contains(BoneFlags::INHERIT_ROTATION),
                translation: flags.contains(BoneFlags::INHERIT_TRANSLATION),
            })
        } else {
            None
        };

        let fixed_axis = if flags.contains(BoneFlags::FIXED_AXIS) {
            Some(reader.read_vec3()?)
        } else {
            None
        };

        let local_axes = if flags.contains(BoneFlags::LOCAL_AXIS) {
            Some(LocalAxes {
                x: reader.read_vec3()?,
                z: reader.read_vec3()?,
            })
        } else {
            None
        };

        let external_parent = if flags.contains(BoneFlags::EXTERNAL_PARENT) {
            Some(reader.read_i32()?)
        } else {
            None
        };

        let ik = if flags.contains(BoneFlags::IK) {
            let target = reader.read_index(width)?;
            let loop_count = reader.read_i32()?;
            let limit_angle = reader.read_f32()?;
            let link_count = reader.read_i32()?.max(0) as usize;
            let mut links = Vec::with_capacity(link_count.min(reader.remaining()));
            for _ in 0..link_count {
                let bone = reader.read_index(width)?;
                let limited = read_enum(reader, "IK limit flag", |v| (v <= 1).then_some(v == 1))?;
                let limits = if limited {
                    Some((reader.read_vec3()?, reader.read_vec3()?))
                } else {
                    None
                };
                links.push(IkLink { bone, limits });
            }
            Some(IkChain {
                target,
                loop_count,
                limit_angle,
                links,
            })
        } else {
            None
        };

        Ok(Self {
            name,
            name_en,
            position,
            parent,
            transform_order,
            flags,
            tail,
            inherit,
            fixed_axis,
            local_axes,
            external_parent,
            ik,
            pmd: None,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        let width = globals.bone_index;
        writer.write_text(&self.name, globals.encoding)?;
        writer.write_text(&self.name_en, globals.encoding)?;
        writer.write_vec3(self.position)?;
        writer.write_index(self.parent, width)?;
        writer.write_i32(self.transform_order)?;
        writer.write_u16(self.effective_flags().bits())?;

        match self.tail {
            BoneTail::Bone(target) => writer.write_index(target, width)?,
            BoneTail::Offset(offset) => writer.write_vec3(offset)?,
        }
        if let Some(link) = &self.inherit {
            writer.write_index(link.parent, width)?;
            writer.write_f32(link.weight)?;
        }
        if let Some(axis) = self.fixed_axis {
            writer.write_vec3(axis)?;
        }
        if let Some(axes) = &self.local_axes {
            writer.write_vec3(axes.x)?;
            writer.write_vec3(axes.z)?;
        }
        if let Some(key) = self.external_parent {
            writer.write_i32(key)?;
        }
        if let Some(ik) = &self.ik {
            writer.write_index(ik.target, width)?;
            writer.write_i32(ik.loop_count)?;
            writer.write_f32(ik.limit_angle)?;
            writer.write_i32(ik.links.len() as i32)?;
            for link in &ik.links {
                writer.write_index(link.bone, width)?;
                match link.limits {
                    Some((lower, upper)) => {
                        writer.write_u8(1)?;
                        writer.write_vec3(lower)?;
                        writer.write_vec3(upper)?;
                    }
                    None => writer.write_u8(0)?,
                }
            }
        }
        Ok(())
    }
}
