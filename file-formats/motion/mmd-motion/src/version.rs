use std::fmt;

use crate::error::{MotionError, Result};

/// Length of the signature field
pub const SIGNATURE_LEN: usize = 30;

pub const SIGNATURE_V2: &[u8] = b"Vocaloid Motion Data 0002";
pub const SIGNATURE_V1: &[u8] = b"Vocaloid Motion Data file";

/// VMD revision, selected by the file signature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum MotionVersion {
    /// Legacy files with a 10-byte model name
    V1,
    /// Current files with a 20-byte model name
    #[default]
    V2,
}

impl MotionVersion {
    pub fn from_signature(field: &[u8]) -> Result<Self> {
        let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
        match &field[..end] {
            s if s == SIGNATURE_V2 => Ok(Self::V2),
            s if s == SIGNATURE_V1 => Ok(Self::V1),
            other => Err(MotionError::UnsupportedVersion(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }

    pub fn signature(self) -> &'static [u8] {
        match self {
            Self::V1 => SIGNATURE_V1,
            Self::V2 => SIGNATURE_V2,
        }
    }

    pub fn model_name_len(self) -> usize {
        match self {
            Self::V1 => 10,
            Self::V2 => 20,
        }
    }
}

impl fmt::Display for MotionVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "VMD (legacy)"),
            Self::V2 => write!(f, "VMD 0002"),
        }
    }
}
