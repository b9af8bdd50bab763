//! Parser and writer for MikuMikuDance model files.
//!
//! Both container variants decode into one [`ModelDocument`]:
//!
//! - PMX 2.0, with UTF-16LE or UTF-8 text and header-declared index widths
//! - PMD 1.0, with fixed-width Shift_JIS text
//!
//! Encoding recomputes index widths and element counts from the document,
//! so re-encoding an unmodified PMX import reproduces the original bytes.
//!
//! # Examples
//!
//! ```
//! use mmd_model::{Bone, ModelDocument};
//!
//! let mut document = ModelDocument::default();
//! document.info.name = "cube".into();
//! document.bones.push(Bone {
//!     name: "センター".into(),
//!     ..Default::default()
//! });
//!
//! let bytes = document.to_bytes().unwrap();
//! let decoded = ModelDocument::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded.bones.len(), 1);
//! assert_eq!(decoded.info.name, "cube");
//! ```

#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod header;
pub mod pmd;
pub mod pmx;
pub mod sections;
pub mod version;

pub use document::ModelDocument;
pub use error::{ModelError, Result};
pub use header::{ModelInfo, PmxGlobals};
pub use mmd_data::{IndexWidth, TextEncoding};
pub use sections::*;
pub use version::ModelFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
