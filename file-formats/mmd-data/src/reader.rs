use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::SHIFT_JIS;
use glam::{Quat, Vec2, Vec3, Vec4};

use crate::error::{DataError, Result};
use crate::types::{IndexWidth, TextEncoding};

/// Sequential little-endian reader over an in-memory buffer.
///
/// Every read is bounds checked; running past the end yields
/// [`DataError::TruncatedData`] with the offset of the failed read.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Borrow the next `len` bytes and advance past them
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(DataError::TruncatedData {
                offset: self.pos,
                requested: len,
                available: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.take(len).map(|_| ())
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    pub fn read_vec2(&mut self) -> Result<Vec2> {
        Ok(Vec2::new(self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    pub fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    /// Quaternion stored as x, y, z, w
    pub fn read_quat(&mut self) -> Result<Quat> {
        Ok(Quat::from_vec4(self.read_vec4()?))
    }

    /// Signed reference of the declared width; negative values mean "none"
    pub fn read_index(&mut self, width: IndexWidth) -> Result<Option<u32>> {
        let value = match width {
            IndexWidth::One => self.read_i8()? as i32,
            IndexWidth::Two => self.read_i16()? as i32,
            IndexWidth::Four => self.read_i32()?,
        };
        Ok(u32::try_from(value).ok())
    }

    /// Vertex index; unsigned for 1 and 2 byte widths
    pub fn read_vertex_index(&mut self, width: IndexWidth) -> Result<u32> {
        Ok(match width {
            IndexWidth::One => self.read_u8()? as u32,
            IndexWidth::Two => self.read_u16()? as u32,
            IndexWidth::Four => {
                let offset = self.pos;
                let value = self.read_i32()?;
                u32::try_from(value)
                    .map_err(|_| DataError::InvalidVertexIndex { offset, value })?
            }
        })
    }

    /// Length-prefixed text in the given encoding
    pub fn read_text(&mut self, encoding: TextEncoding) -> Result<String> {
        let offset = self.pos;
        let len = self.read_i32()?;
        let byte_len =
            usize::try_from(len).map_err(|_| DataError::InvalidTextLength { offset, len })?;
        let bytes = self.take(byte_len)?;

        Ok(match encoding {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Utf16Le => {
                let chunks = bytes.chunks_exact(2);
                if !chunks.remainder().is_empty() {
                    log::trace!("Dropped odd trailing byte of UTF-16 text at offset {offset}");
                }
                let units: Vec<u16> = chunks.map(LittleEndian::read_u16).collect();
                String::from_utf16_lossy(&units)
            }
        })
    }

    /// NUL-terminated Shift_JIS text in a fixed-width field
    pub fn read_fixed_sjis(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(len);
        let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(&bytes[..end]);
        if had_errors {
            log::trace!("Replaced malformed Shift_JIS sequence at offset {}", self.pos - len);
        }
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_numeric() {
        let data = [0x01, 0xFE, 0xFF, 0x00, 0x00, 0x80, 0x3F];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_truncated_carries_offset_and_length() {
        let data = [0u8; 3];
        let mut reader = ByteReader::new(&data);
        reader.skip(2).unwrap();
        match reader.read_u32() {
            Err(DataError::TruncatedData {
                offset,
                requested,
                available,
            }) => {
                assert_eq!(offset, 2);
                assert_eq!(requested, 4);
                assert_eq!(available, 1);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
        // A failed read does not advance
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_index_sentinel() {
        let data = [0xFF, 0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_index(IndexWidth::One).unwrap(), None);
        assert_eq!(reader.read_index(IndexWidth::One).unwrap(), Some(5));
        assert_eq!(reader.read_index(IndexWidth::Two).unwrap(), None);
        assert_eq!(reader.read_vertex_index(IndexWidth::Two).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_read_text_utf16() {
        let mut data = 4i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0x42, 0x30, 0x41, 0x00]);
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_text(TextEncoding::Utf16Le).unwrap(), "\u{3042}A");
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_read_text_past_end_is_truncated() {
        let mut data = 100i32.to_le_bytes().to_vec();
        data.extend_from_slice(b"abc");
        let mut reader = ByteReader::new(&data);
        match reader.read_text(TextEncoding::Utf8) {
            Err(DataError::TruncatedData {
                offset,
                requested,
                available,
            }) => {
                assert_eq!(offset, 4);
                assert_eq!(requested, 100);
                assert_eq!(available, 3);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_read_text_rejects_negative_length() {
        let data = (-2i32).to_le_bytes();
        let mut reader = ByteReader::new(&data);
        assert!(matches!(
            reader.read_text(TextEncoding::Utf8),
            Err(DataError::InvalidTextLength { offset: 0, len: -2 })
        ));
    }

    #[test]
    fn test_read_text_utf16_odd_length() {
        let mut data = 3i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0x41, 0x00, 0x42]);
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_text(TextEncoding::Utf16Le).unwrap(), "A");
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_negative_wide_vertex_index_rejected() {
        let mut data = 7i32.to_le_bytes().to_vec();
        data.extend_from_slice(&(-5i32).to_le_bytes());
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_vertex_index(IndexWidth::Four).unwrap(), 7);
        assert!(matches!(
            reader.read_vertex_index(IndexWidth::Four),
            Err(DataError::InvalidVertexIndex {
                offset: 4,
                value: -5
            })
        ));
    }

    #[test]
    fn test_read_fixed_sjis() {
        // "センター" followed by NUL and padding
        let mut data = vec![0x83, 0x5A, 0x83, 0x93, 0x83, 0x5E, 0x81, 0x5B, 0x00];
        data.resize(15, 0xFD);
        let mut reader = ByteReader::new(&data);
        assert_eq!(reader.read_fixed_sjis(15).unwrap(), "センター");
        assert!(reader.is_at_end());
    }
}
