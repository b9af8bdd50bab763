//! Model sections: logical types plus their PMX field layouts

use std::fmt;

use mmd_data::{ByteReader, ByteWriter};

use crate::error::{ModelError, Result};

pub mod bone;
pub mod frame;
pub mod joint;
pub mod material;
pub mod morph;
pub mod rigid_body;
pub mod vertex;

pub use bone::{Bone, BoneFlags, BoneTail, IkChain, IkLink, InheritLink, LocalAxes, PmdBoneExtra};
pub use frame::{DisplayFrame, FrameItem};
pub use joint::Joint;
pub use material::{Material, MaterialFlags, SphereMode, Toon};
pub use morph::{
    BoneOffset, GroupOffset, MaterialOffset, Morph, MorphKind, MorphOffsets, UvOffset,
    VertexOffset,
};
pub use rigid_body::{PhysicsMode, RigidBody, RigidShape};
pub use vertex::{Skinning, Vertex};

/// Sections of a model file, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Vertices,
    Faces,
    Textures,
    Materials,
    Bones,
    IkChains,
    Morphs,
    DisplayFrames,
    ToonTextures,
    RigidBodies,
    Joints,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Header => "header",
            Self::Vertices => "vertices",
            Self::Faces => "faces",
            Self::Textures => "textures",
            Self::Materials => "materials",
            Self::Bones => "bones",
            Self::IkChains => "IK chains",
            Self::Morphs => "morphs",
            Self::DisplayFrames => "display frames",
            Self::ToonTextures => "toon textures",
            Self::RigidBodies => "rigid bodies",
            Self::Joints => "joints",
        };
        f.write_str(name)
    }
}

/// Validate a declared element count against the bytes left in the buffer.
///
/// `min_record` is the smallest possible encoded size of one element, so a
/// count that passes may still fail later with a truncation error.
pub(crate) fn check_count(
    reader: &ByteReader<'_>,
    section: Section,
    offset: usize,
    declared: i64,
    min_record: usize,
) -> Result<usize> {
    let mismatch = || ModelError::SectionSizeMismatch {
        section,
        offset,
        declared,
        available: reader.remaining(),
    };
    let count = usize::try_from(declared).map_err(|_| mismatch())?;
    if count.saturating_mul(min_record) > reader.remaining() {
        return Err(mismatch());
    }
    Ok(count)
}

/// Read a PMX `i32` element count and validate it
pub(crate) fn read_pmx_count(
    reader: &mut ByteReader<'_>,
    section: Section,
    min_record: usize,
) -> Result<usize> {
    let offset = reader.position();
    let declared = reader.read_i32()?;
    let count = check_count(reader, section, offset, declared as i64, min_record)?;
    log::debug!("{section}: {count} element(s) at offset {offset}");
    Ok(count)
}

pub(crate) fn write_pmx_count(writer: &mut ByteWriter, count: usize) -> Result<()> {
    let count = i32::try_from(count)
        .map_err(|_| ModelError::EncodeError(format!("{count} elements exceed i32")))?;
    writer.write_i32(count)?;
    Ok(())
}

/// Map an enumerated byte to a typed value or report it with its offset
pub(crate) fn read_enum<T>(
    reader: &mut ByteReader<'_>,
    field: &'static str,
    convert: impl FnOnce(u8) -> Option<T>,
) -> Result<T> {
    let offset = reader.position();
    let value = reader.read_u8()?;
    convert(value).ok_or(ModelError::InvalidValue {
        field,
        value: value as u32,
        offset,
    })
}
