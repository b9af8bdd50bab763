//! Binary primitives shared by the MMD model and motion codecs.
//!
//! [`ByteReader`] and [`ByteWriter`] implement the little-endian numeric
//! contract of the formats, the two length-prefixed text encodings,
//! fixed-width Shift_JIS fields and index fields whose width is declared
//! by the file header.
//!
//! ```
//! use mmd_data::{ByteReader, ByteWriter, IndexWidth};
//!
//! let mut writer = ByteWriter::new();
//! writer.write_index(None, IndexWidth::Two).unwrap();
//! writer.write_f32(1.5).unwrap();
//!
//! let bytes = writer.into_inner();
//! let mut reader = ByteReader::new(&bytes);
//! assert_eq!(reader.read_index(IndexWidth::Two).unwrap(), None);
//! assert_eq!(reader.read_f32().unwrap(), 1.5);
//! ```

pub mod error;
pub mod reader;
pub mod types;
pub mod writer;

pub use error::{DataError, Result};
pub use reader::ByteReader;
pub use types::{IndexWidth, TextEncoding};
pub use writer::ByteWriter;
