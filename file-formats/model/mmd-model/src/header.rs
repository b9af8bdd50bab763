use mmd_data::{ByteReader, ByteWriter, IndexWidth, TextEncoding};

use crate::document::ModelDocument;
use crate::error::{ModelError, Result};
use crate::version::{PMX_MAGIC, PMX_VERSION};

/// Number of globals defined by PMX 2.0
const PMX_GLOBAL_COUNT: u8 = 8;

/// Names and comments carried in the model header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelInfo {
    pub name: String,
    pub name_en: String,
    pub comment: String,
    pub comment_en: String,
}

/// PMX header globals: text encoding, additional UV count and index widths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PmxGlobals {
    pub encoding: TextEncoding,
    pub additional_uv: u8,
    pub vertex_index: IndexWidth,
    pub texture_index: IndexWidth,
    pub material_index: IndexWidth,
    pub bone_index: IndexWidth,
    pub morph_index: IndexWidth,
    pub rigid_body_index: IndexWidth,
}

impl PmxGlobals {
    /// Globals for writing `document`, derived from its contents only
    pub fn for_document(document: &ModelDocument, encoding: TextEncoding) -> Result<Self> {
        let additional_uv = document
            .vertices
            .iter()
            .map(|v| v.additional_uvs.len())
            .max()
            .unwrap_or(0);
        if additional_uv > 4 {
            return Err(ModelError::EncodeError(format!(
                "{additional_uv} additional UV channels, at most 4 are supported"
            )));
        }

        Ok(Self {
            encoding,
            additional_uv: additional_uv as u8,
            vertex_index: IndexWidth::for_vertex_count(document.vertices.len()),
            texture_index: IndexWidth::for_count(document.textures.len()),
            material_index: IndexWidth::for_count(document.materials.len()),
            bone_index: IndexWidth::for_count(document.bones.len()),
            morph_index: IndexWidth::for_count(document.morphs.len()),
            rigid_body_index: IndexWidth::for_count(document.rigid_bodies.len()),
        })
    }

    /// Read magic, version and globals
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let magic: [u8; 4] = reader.read_array()?;
        if magic != PMX_MAGIC {
            return Err(ModelError::InvalidMagic {
                expected: String::from_utf8_lossy(&PMX_MAGIC).into(),
                actual: String::from_utf8_lossy(&magic).into(),
            });
        }

        let version = reader.read_f32()?;
        if version != PMX_VERSION {
            return Err(ModelError::UnsupportedVersion(format!("PMX {version:.1}")));
        }

        let offset = reader.position();
        let count = reader.read_u8()?;
        if count < PMX_GLOBAL_COUNT {
            return Err(ModelError::InvalidValue {
                field: "global count",
                value: count as u32,
                offset,
            });
        }
        let globals = reader.take(count as usize)?;

        let additional_uv = globals[1];
        if additional_uv > 4 {
            return Err(ModelError::InvalidValue {
                field: "additional UV count",
                value: additional_uv as u32,
                offset: offset + 2,
            });
        }
        if count > PMX_GLOBAL_COUNT {
            log::debug!("Skipping {} unknown PMX globals", count - PMX_GLOBAL_COUNT);
        }

        Ok(Self {
            encoding: TextEncoding::try_from(globals[0])?,
            additional_uv,
            vertex_index: IndexWidth::try_from(globals[2])?,
            texture_index: IndexWidth::try_from(globals[3])?,
            material_index: IndexWidth::try_from(globals[4])?,
            bone_index: IndexWidth::try_from(globals[5])?,
            morph_index: IndexWidth::try_from(globals[6])?,
            rigid_body_index: IndexWidth::try_from(globals[7])?,
        })
    }

    pub fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        writer.write_bytes(&PMX_MAGIC);
        writer.write_f32(PMX_VERSION)?;
        writer.write_u8(PMX_GLOBAL_COUNT)?;
        writer.write_bytes(&[
            self.encoding.into(),
            self.additional_uv,
            self.vertex_index.into(),
            self.texture_index.into(),
            self.material_index.into(),
            self.bone_index.into(),
            self.morph_index.into(),
            self.rigid_body_index.into(),
        ]);
        Ok(())
    }
}

impl ModelInfo {
    pub fn read_pmx(reader: &mut ByteReader<'_>, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            name: reader.read_text(encoding)?,
            name_en: reader.read_text(encoding)?,
            comment: reader.read_text(encoding)?,
            comment_en: reader.read_text(encoding)?,
        })
    }

    pub fn write_pmx(&self, writer: &mut ByteWriter, encoding: TextEncoding) -> Result<()> {
        writer.write_text(&self.name, encoding)?;
        writer.write_text(&self.name_en, encoding)?;
        writer.write_text(&self.comment, encoding)?;
        writer.write_text(&self.comment_en, encoding)?;
        Ok(())
    }
}
