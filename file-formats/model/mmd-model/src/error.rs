use std::io;

use mmd_data::DataError;
use thiserror::Error;

use crate::sections::Section;

/// Error types for model decoding and encoding
#[derive(Error, Debug)]
pub enum ModelError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Low-level decode failure, including truncated buffers
    #[error(transparent)]
    Data(#[from] DataError),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Unsupported file version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A declared element count cannot fit into the remaining bytes
    #[error(
        "Section size mismatch in {section} at offset {offset}: {declared} element(s) declared, {available} byte(s) available"
    )]
    SectionSizeMismatch {
        section: Section,
        offset: usize,
        declared: i64,
        available: usize,
    },

    /// An enumerated field holds a value outside its defined range
    #[error("Invalid {field} value {value} at offset {offset}")]
    InvalidValue {
        field: &'static str,
        value: u32,
        offset: usize,
    },

    /// The document cannot be represented in the requested format
    #[error("Encode error: {0}")]
    EncodeError(String),
}

/// Result type using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Byte offset the failure was detected at, when known
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Data(DataError::TruncatedData { offset, .. })
            | Self::Data(DataError::InvalidTextLength { offset, .. })
            | Self::Data(DataError::InvalidVertexIndex { offset, .. })
            | Self::SectionSizeMismatch { offset, .. }
            | Self::InvalidValue { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Data(DataError::TruncatedData { .. }))
    }
}
