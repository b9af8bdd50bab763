//! Parser and writer for MikuMikuDance VMD motion files.
//!
//! A [`MotionDocument`] holds one [`Track`] per named bone and morph plus
//! scene-level camera, light, self-shadow and visibility/IK tracks. Tracks
//! keep their keys sorted by frame; inserting a key on an occupied frame
//! replaces the existing key.
//!
//! # Examples
//!
//! ```
//! use mmd_motion::{BoneKey, MotionDocument};
//!
//! let mut motion = MotionDocument::default();
//! motion.model_name = "初音ミク".into();
//! motion.bones.insert("センター", BoneKey { frame: 10, ..Default::default() });
//! motion.bones.insert("センター", BoneKey { frame: 0, ..Default::default() });
//!
//! let bytes = motion.to_bytes().unwrap();
//! let decoded = MotionDocument::from_bytes(&bytes).unwrap();
//! assert_eq!(decoded.bones.get("センター").unwrap().frames(), vec![0, 10]);
//! ```

#![forbid(unsafe_code)]

pub mod channel;
pub mod document;
pub mod error;
pub mod interpolation;
pub mod keys;
pub mod track;
pub mod version;
pub mod vmd;

pub use channel::ChannelKind;
pub use document::{CAMERA_MODEL_NAME, MotionDocument};
pub use error::{MotionError, Result};
pub use interpolation::BezierCurve;
pub use keys::{
    BoneInterpolation, BoneKey, CameraInterpolation, CameraKey, IkState, LightKey, MorphKey,
    PropertyKey, ShadowKey,
};
pub use track::{Channels, Keyframe, Track};
pub use version::MotionVersion;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
