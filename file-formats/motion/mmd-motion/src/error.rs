use std::io;

use mmd_data::DataError;
use thiserror::Error;

use crate::channel::ChannelKind;

fn describe_unknown(tag: &Option<u8>, offset: &Option<usize>) -> String {
    let tag = tag.map_or_else(|| "record".to_string(), |t| format!("tag {t}"));
    match offset {
        Some(offset) => format!("{tag} at offset {offset}"),
        None => tag,
    }
}

/// Error types for motion decoding and encoding
#[derive(Error, Debug)]
pub enum MotionError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Low-level decode failure, including truncated buffers
    #[error(transparent)]
    Data(#[from] DataError),

    /// Signature does not name a known motion format version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),

    /// A record of a channel kind outside the recognised set
    #[error("Unknown channel kind: {}", describe_unknown(.tag, .offset))]
    UnknownChannelKind {
        tag: Option<u8>,
        offset: Option<usize>,
    },

    /// A declared key count cannot fit into the remaining bytes
    #[error(
        "Section size mismatch in {kind} keys at offset {offset}: {declared} key(s) declared, {available} byte(s) available"
    )]
    SectionSizeMismatch {
        kind: ChannelKind,
        offset: usize,
        declared: u32,
        available: usize,
    },

    /// The document cannot be written as VMD
    #[error("Encode error: {0}")]
    EncodeError(String),
}

/// Result type using MotionError
pub type Result<T> = std::result::Result<T, MotionError>;

impl MotionError {
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Data(DataError::TruncatedData { offset, .. })
            | Self::SectionSizeMismatch { offset, .. } => Some(*offset),
            Self::UnknownChannelKind { offset, .. } => *offset,
            _ => None,
        }
    }
}
