use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read ran past the end of the buffer
    #[error("Truncated data: needed {requested} bytes at offset {offset}, {available} available")]
    TruncatedData {
        offset: usize,
        requested: usize,
        available: usize,
    },

    #[error("Invalid index width {0}: expected 1, 2 or 4")]
    InvalidIndexWidth(u8),

    #[error("Invalid text encoding flag {0}")]
    InvalidTextEncoding(u8),

    /// An index that does not fit into the declared width on write
    #[error("Index {index} does not fit into {width} byte(s)")]
    IndexOverflow { index: u32, width: u8 },

    #[error("Negative text length {len} at offset {offset}")]
    InvalidTextLength { offset: usize, len: i32 },

    /// A 4-byte vertex index below zero
    #[error("Invalid vertex index {value} at offset {offset}")]
    InvalidVertexIndex { offset: usize, value: i32 },
}

pub type Result<T> = std::result::Result<T, DataError>;
