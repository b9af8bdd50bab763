use std::fs;
use std::path::Path;

use mmd_data::TextEncoding;

use crate::error::Result;
use crate::header::ModelInfo;
use crate::sections::{Bone, DisplayFrame, Joint, Material, Morph, RigidBody, Vertex};
use crate::version::ModelFormat;
use crate::{pmd, pmx};

/// In-memory model, shared by both container variants
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelDocument {
    /// Variant the document was decoded from; used by [`ModelDocument::to_bytes`]
    pub format: ModelFormat,
    pub info: ModelInfo,
    pub vertices: Vec<Vertex>,
    /// Triangles as vertex index triples
    pub faces: Vec<[u32; 3]>,
    pub textures: Vec<String>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub morphs: Vec<Morph>,
    pub display_frames: Vec<DisplayFrame>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<Joint>,
    /// The ten shared toon texture names of a PMD file
    pub toon_textures: Vec<String>,
}

impl ModelDocument {
    /// Decode a PMX or PMD file, detected from its magic
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match ModelFormat::detect(data)? {
            ModelFormat::Pmx { .. } => pmx::decode(data),
            ModelFormat::Pmd => pmd::decode(data),
        }
    }

    /// Encode in the variant recorded in [`ModelDocument::format`]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.encode_as(self.format)
    }

    pub fn encode_as(&self, format: ModelFormat) -> Result<Vec<u8>> {
        match format {
            ModelFormat::Pmx { encoding } => pmx::encode(self, encoding),
            ModelFormat::Pmd => pmd::encode(self),
        }
    }

    /// Load a model from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Save a model to a file in its recorded variant
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_bytes()?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Text encoding used when this document is written as PMX
    pub fn pmx_encoding(&self) -> TextEncoding {
        match self.format {
            ModelFormat::Pmx { encoding } => encoding,
            ModelFormat::Pmd => TextEncoding::Utf16Le,
        }
    }

    /// Index of the first bone with the given local name
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_morph(&self, name: &str) -> Option<usize> {
        self.morphs.iter().position(|m| m.name == name)
    }

    /// Children of each bone, by index
    pub fn bone_children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.bones.len()];
        for (index, bone) in self.bones.iter().enumerate() {
            if let Some(parent) = bone.parent.map(|p| p as usize)
                && parent < children.len()
            {
                children[parent].push(index);
            }
        }
        children
    }
}
