use std::fmt;

use crate::error::{DataError, Result};

/// Byte width of an index field, selected per index kind by the file header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexWidth {
    #[default]
    One,
    Two,
    Four,
}

impl IndexWidth {
    pub fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }

    /// Narrowest width for signed references into a table of `count`
    /// elements, keeping the all-bits-set pattern free for "none".
    pub fn for_count(count: usize) -> Self {
        if count < 0x80 {
            Self::One
        } else if count < 0x8000 {
            Self::Two
        } else {
            Self::Four
        }
    }

    /// Narrowest width for vertex indices, which are unsigned below 4 bytes.
    pub fn for_vertex_count(count: usize) -> Self {
        if count < 0x100 {
            Self::One
        } else if count < 0x1_0000 {
            Self::Two
        } else {
            Self::Four
        }
    }

    /// Largest index representable as a signed reference of this width
    pub fn max_signed(self) -> u32 {
        match self {
            Self::One => i8::MAX as u32,
            Self::Two => i16::MAX as u32,
            Self::Four => i32::MAX as u32,
        }
    }

    /// Largest index representable as a vertex index of this width
    pub fn max_vertex(self) -> u32 {
        match self {
            Self::One => u8::MAX as u32,
            Self::Two => u16::MAX as u32,
            Self::Four => i32::MAX as u32,
        }
    }
}

impl TryFrom<u8> for IndexWidth {
    type Error = DataError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            _ => Err(DataError::InvalidIndexWidth(value)),
        }
    }
}

impl From<IndexWidth> for u8 {
    fn from(value: IndexWidth) -> Self {
        value.bytes() as u8
    }
}

impl fmt::Display for IndexWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} byte(s)", self.bytes())
    }
}

/// Encoding of length-prefixed text, selected by the header flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    #[default]
    Utf16Le,
    Utf8,
}

impl TryFrom<u8> for TextEncoding {
    type Error = DataError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Utf16Le),
            1 => Ok(Self::Utf8),
            _ => Err(DataError::InvalidTextEncoding(value)),
        }
    }
}

impl From<TextEncoding> for u8 {
    fn from(value: TextEncoding) -> Self {
        match value {
            TextEncoding::Utf16Le => 0,
            TextEncoding::Utf8 => 1,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf16Le => write!(f, "UTF-16LE"),
            Self::Utf8 => write!(f, "UTF-8"),
        }
    }
}
