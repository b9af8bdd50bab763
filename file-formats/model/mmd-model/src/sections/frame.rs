use mmd_data::{ByteReader, ByteWriter};

use crate::error::Result;
use crate::header::PmxGlobals;

use super::{Section, read_enum, read_pmx_count, write_pmx_count};

/// Entry of a display frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameItem {
    Bone(Option<u32>),
    Morph(Option<u32>),
}

/// Named group of bones and morphs shown together in the editor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayFrame {
    pub name: String,
    pub name_en: String,
    /// Built-in frames (`Root`, `表情`) cannot be removed
    pub special: bool,
    pub items: Vec<FrameItem>,
}

impl DisplayFrame {
    pub(crate) fn min_pmx_size() -> usize {
        8 + 1 + 4
    }

    pub(crate) fn read_pmx(reader: &mut ByteReader<'_>, globals: &PmxGlobals) -> Result<Self> {
        let name = reader.read_text(globals.encoding)?;
        let name_en = reader.read_text(globals.encoding)?;
        let special = read_enum(reader, "display frame flag", |v| (v <= 1).then_some(v == 1))?;

        let min_item = 1 + globals.bone_index.bytes().min(globals.morph_index.bytes());
        let count = read_pmx_count(reader, Section::DisplayFrames, min_item)?;
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            let target = read_enum(reader, "display frame target", |v| (v <= 1).then_some(v))?;
            items.push(match target {
                0 => FrameItem::Bone(reader.read_index(globals.bone_index)?),
                _ => FrameItem::Morph(reader.read_index(globals.morph_index)?),
            });
        }

        Ok(Self {
            name,
            name_en,
            special,
            items,
        })
    }

    pub(crate) fn write_pmx(&self, writer: &mut ByteWriter, globals: &PmxGlobals) -> Result<()> {
        writer.write_text(&self.name, globals.encoding)?;
        writer.write_text(&self.name_en, globals.encoding)?;
        writer.write_u8(self.special as u8)?;
        write_pmx_count(writer, self.items.len())?;
        for item in &self.items {
            match *item {
                FrameItem::Bone(bone) => {
                    writer.write_u8(0)?;
                    writer.write_index(bone, globals.bone_index)?;
                }
                FrameItem::Morph(morph) => {
                    writer.write_u8(1)?;
                    writer.write_index(morph, globals.morph_index)?;
                }
            }
        }
        Ok(())
    }
}
