use byteorder::{LittleEndian, WriteBytesExt};
use encoding_rs::SHIFT_JIS;
use glam::{Quat, Vec2, Vec3, Vec4};

use crate::error::{DataError, Result};
use crate::types::{IndexWidth, TextEncoding};

/// Growable little-endian writer, the counterpart of [`crate::ByteReader`]
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, n: u8) -> Result<()> {
        Ok(self.buf.write_u8(n)?)
    }

    pub fn write_i8(&mut self, n: i8) -> Result<()> {
        Ok(self.buf.write_i8(n)?)
    }

    pub fn write_u16(&mut self, n: u16) -> Result<()> {
        Ok(self.buf.write_u16::<LittleEndian>(n)?)
    }

    pub fn write_i16(&mut self, n: i16) -> Result<()> {
        Ok(self.buf.write_i16::<LittleEndian>(n)?)
    }

    pub fn write_u32(&mut self, n: u32) -> Result<()> {
        Ok(self.buf.write_u32::<LittleEndian>(n)?)
    }

    pub fn write_i32(&mut self, n: i32) -> Result<()> {
        Ok(self.buf.write_i32::<LittleEndian>(n)?)
    }

    pub fn write_f32(&mut self, n: f32) -> Result<()> {
        Ok(self.buf.write_f32::<LittleEndian>(n)?)
    }

    pub fn write_vec2(&mut self, v: Vec2) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)
    }

    pub fn write_vec3(&mut self, v: Vec3) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)
    }

    pub fn write_vec4(&mut self, v: Vec4) -> Result<()> {
        self.write_f32(v.x)?;
        self.write_f32(v.y)?;
        self.write_f32(v.z)?;
        self.write_f32(v.w)
    }

    pub fn write_quat(&mut self, q: Quat) -> Result<()> {
        self.write_vec4(Vec4::from(q))
    }

    /// Signed reference of the given width; `None` writes all bits set
    pub fn write_index(&mut self, index: Option<u32>, width: IndexWidth) -> Result<()> {
        let Some(index) = index else {
            return match width {
                IndexWidth::One => self.write_i8(-1),
                IndexWidth::Two => self.write_i16(-1),
                IndexWidth::Four => self.write_i32(-1),
            };
        };
        if index > width.max_signed() {
            return Err(DataError::IndexOverflow {
                index,
                width: width.into(),
            });
        }
        match width {
            IndexWidth::One => self.write_i8(index as i8),
            IndexWidth::Two => self.write_i16(index as i16),
            IndexWidth::Four => self.write_i32(index as i32),
        }
    }

    pub fn write_vertex_index(&mut self, index: u32, width: IndexWidth) -> Result<()> {
        if index > width.max_vertex() {
            return Err(DataError::IndexOverflow {
                index,
                width: width.into(),
            });
        }
        match width {
            IndexWidth::One => self.write_u8(index as u8),
            IndexWidth::Two => self.write_u16(index as u16),
            IndexWidth::Four => self.write_i32(index as i32),
        }
    }

    pub fn write_text(&mut self, text: &str, encoding: TextEncoding) -> Result<()> {
        match encoding {
            TextEncoding::Utf8 => {
                self.write_i32(text.len() as i32)?;
                self.write_bytes(text.as_bytes());
            }
            TextEncoding::Utf16Le => {
                let units: Vec<u16> = text.encode_utf16().collect();
                self.write_i32((units.len() * 2) as i32)?;
                for unit in units {
                    self.write_u16(unit)?;
                }
            }
        }
        Ok(())
    }

    /// Shift_JIS text in a fixed-width, NUL-padded field.
    ///
    /// Text longer than the field is cut at a character boundary so the
    /// field never ends in half of a double-byte character.
    pub fn write_fixed_sjis(&mut self, text: &str, len: usize) -> Result<()> {
        let mut field = vec![0u8; len];
        let mut written = 0;
        let mut scratch = [0u8; 4];
        for ch in text.chars() {
            let (encoded, _, unmappable) = SHIFT_JIS.encode(ch.encode_utf8(&mut scratch));
            if unmappable {
                log::trace!("Character {ch:?} has no Shift_JIS mapping");
            }
            if written + encoded.len() > len {
                break;
            }
            field[written..written + encoded.len()].copy_from_slice(&encoded);
            written += encoded.len();
        }
        self.write_bytes(&field);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteReader;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_sentinel_uses_declared_width() {
        let mut writer = ByteWriter::new();
        writer.write_index(None, IndexWidth::One).unwrap();
        writer.write_index(None, IndexWidth::Two).unwrap();
        writer.write_index(Some(3), IndexWidth::Four).unwrap();
        assert_eq!(
            writer.as_bytes(),
            &[0xFF, 0xFF, 0xFF, 0x03, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_index_overflow() {
        let mut writer = ByteWriter::new();
        assert!(matches!(
            writer.write_index(Some(128), IndexWidth::One),
            Err(DataError::IndexOverflow { index: 128, width: 1 })
        ));
        assert!(writer.write_vertex_index(255, IndexWidth::One).is_ok());
        assert!(writer.write_vertex_index(256, IndexWidth::One).is_err());
    }

    #[test]
    fn test_text_is_read_back() {
        let mut writer = ByteWriter::new();
        writer.write_text("左腕", TextEncoding::Utf16Le).unwrap();
        writer.write_text("arm_L", TextEncoding::Utf8).unwrap();
        writer.write_fixed_sjis("右足ＩＫ", 15).unwrap();
        assert_eq!(writer.len(), 4 + 4 + 4 + 5 + 15);

        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_text(TextEncoding::Utf16Le).unwrap(), "左腕");
        assert_eq!(reader.read_text(TextEncoding::Utf8).unwrap(), "arm_L");
        assert_eq!(reader.read_fixed_sjis(15).unwrap(), "右足ＩＫ");
    }

    #[test]
    fn test_fixed_sjis_truncates_on_char_boundary() {
        let mut writer = ByteWriter::new();
        // Each kana is two bytes; three of them do not fit into five bytes
        writer.write_fixed_sjis("アイウ", 5).unwrap();
        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[4], 0);
        assert_eq!(ByteReader::new(&bytes).read_fixed_sjis(5).unwrap(), "アイ");
    }
}
