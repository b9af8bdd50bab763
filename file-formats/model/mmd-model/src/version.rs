use std::fmt;

use mmd_data::TextEncoding;

use crate::error::{ModelError, Result};

pub const PMX_MAGIC: [u8; 4] = *b"PMX ";
pub const PMD_MAGIC: [u8; 3] = *b"Pmd";

pub const PMX_VERSION: f32 = 2.0;
pub const PMD_VERSION: f32 = 1.0;

/// Container variant a model document was decoded from or will be encoded to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelFormat {
    /// PMX 2.0 with length-prefixed text in the given encoding
    Pmx { encoding: TextEncoding },
    /// PMD 1.0 with fixed-width Shift_JIS text
    Pmd,
}

impl Default for ModelFormat {
    fn default() -> Self {
        Self::Pmx {
            encoding: TextEncoding::Utf16Le,
        }
    }
}

impl ModelFormat {
    /// Detect the container variant from the leading bytes of a file
    pub fn detect(data: &[u8]) -> Result<Self> {
        if data.starts_with(&PMX_MAGIC) {
            // Encoding is refined once the globals are read
            Ok(Self::default())
        } else if data.starts_with(&PMD_MAGIC) {
            Ok(Self::Pmd)
        } else {
            let actual = &data[..data.len().min(4)];
            Err(ModelError::InvalidMagic {
                expected: "PMX  or Pmd".into(),
                actual: String::from_utf8_lossy(actual).into(),
            })
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pmx { .. } => "pmx",
            Self::Pmd => "pmd",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pmx" => Some(Self::default()),
            "pmd" => Some(Self::Pmd),
            _ => None,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pmx { encoding } => write!(f, "PMX 2.0 ({encoding})"),
            Self::Pmd => write!(f, "PMD 1.0"),
        }
    }
}
