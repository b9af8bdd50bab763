//! Key records of each channel kind

use glam::{Quat, Vec3};

use crate::interpolation::BezierCurve;
use crate::track::Keyframe;

/// Size of the interpolation block of a bone key
pub const BONE_INTERPOLATION_LEN: usize = 64;
/// Size of the interpolation block of a camera key
pub const CAMERA_INTERPOLATION_LEN: usize = 24;

/// Easing curves of a bone key: X, Y and Z translation plus rotation.
///
/// The 64-byte block holds four rows; row 0 is
/// `x1[X Y Z R] y1[X Y Z R] x2[X Y Z R] y2[X Y Z R]` and each following row
/// repeats it shifted left by one byte. The original bytes are kept so
/// unchanged curves re-encode verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneInterpolation {
    pub x: BezierCurve,
    pub y: BezierCurve,
    pub z: BezierCurve,
    pub rotation: BezierCurve,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    raw: Option<[u8; BONE_INTERPOLATION_LEN]>,
}

impl Default for BoneInterpolation {
    fn default() -> Self {
        Self::uniform(BezierCurve::LINEAR)
    }
}

impl BoneInterpolation {
    /// Same curve on every component
    pub fn uniform(curve: BezierCurve) -> Self {
        Self {
            x: curve,
            y: curve,
            z: curve,
            rotation: curve,
            raw: None,
        }
    }

    pub fn curves(&self) -> [BezierCurve; 4] {
        [self.x, self.y, self.z, self.rotation]
    }

    pub fn from_bytes(bytes: [u8; BONE_INTERPOLATION_LEN]) -> Self {
        let curve = |c: usize| BezierCurve::new(bytes[c], bytes[4 + c], bytes[8 + c], bytes[12 + c]);
        Self {
            x: curve(0),
            y: curve(1),
            z: curve(2),
            rotation: curve(3),
            raw: Some(bytes),
        }
    }

    /// Canonical block for the current curves
    fn canonical(&self) -> [u8; BONE_INTERPOLATION_LEN] {
        let curves = self.curves();
        let mut row = [0u8; 16];
        for (c, curve) in curves.iter().enumerate() {
            row[c] = curve.x1;
            row[4 + c] = curve.y1;
            row[8 + c] = curve.x2;
            row[12 + c] = curve.y2;
        }
        let mut bytes = [0u8; BONE_INTERPOLATION_LEN];
        for shift in 0..4 {
            let start = shift * 16;
            bytes[start..start + 16 - shift].copy_from_slice(&row[shift..]);
        }
        bytes
    }

    /// Bytes to write: the original block when the curves are unchanged
    pub fn to_bytes(&self) -> [u8; BONE_INTERPOLATION_LEN] {
        match self.raw {
            Some(raw) if Self::from_bytes(raw).curves() == self.curves() => raw,
            _ => self.canonical(),
        }
    }
}

impl PartialEq<[BezierCurve; 4]> for BoneInterpolation {
    fn eq(&self, other: &[BezierCurve; 4]) -> bool {
        self.curves() == *other
    }
}

/// Easing curves of a camera key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraInterpolation {
    pub x: BezierCurve,
    pub y: BezierCurve,
    pub z: BezierCurve,
    pub rotation: BezierCurve,
    pub distance: BezierCurve,
    pub fov: BezierCurve,
}

impl CameraInterpolation {
    pub fn curves(&self) -> [BezierCurve; 6] {
        [self.x, self.y, self.z, self.rotation, self.distance, self.fov]
    }

    /// Six curves stored as `x1 x2 y1 y2`
    pub fn from_bytes(bytes: [u8; CAMERA_INTERPOLATION_LEN]) -> Self {
        let curve = |c: usize| {
            let b = &bytes[c * 4..c * 4 + 4];
            BezierCurve::new(b[0], b[2], b[1], b[3])
        };
        Self {
            x: curve(0),
            y: curve(1),
            z: curve(2),
            rotation: curve(3),
            distance: curve(4),
            fov: curve(5),
        }
    }

    pub fn to_bytes(&self) -> [u8; CAMERA_INTERPOLATION_LEN] {
        let mut bytes = [0u8; CAMERA_INTERPOLATION_LEN];
        for (c, curve) in self.curves().iter().enumerate() {
            bytes[c * 4..c * 4 + 4].copy_from_slice(&[curve.x1, curve.x2, curve.y1, curve.y2]);
        }
        bytes
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneKey {
    pub frame: u32,
    /// Translation relative to the rest pose
    pub position: Vec3,
    pub rotation: Quat,
    pub interpolation: BoneInterpolation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphKey {
    pub frame: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraKey {
    pub frame: u32,
    /// Signed distance from the target; negative values put the camera in front
    pub distance: f32,
    pub target: Vec3,
    /// Euler rotation in radians
    pub rotation: Vec3,
    pub interpolation: CameraInterpolation,
    /// Field of view in degrees
    pub fov: u32,
    pub perspective: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LightKey {
    pub frame: u32,
    pub color: Vec3,
    pub direction: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadowKey {
    pub frame: u32,
    /// 0 off, 1 mode 1, 2 mode 2
    pub mode: u8,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkState {
    pub name: String,
    pub enabled: bool,
}

/// Model visibility and IK switches on one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyKey {
    pub frame: u32,
    pub visible: bool,
    pub ik_states: Vec<IkState>,
}

macro_rules! impl_keyframe {
    ($($ty:ty),*) => {
        $(
            impl Keyframe for $ty {
                fn frame(&self) -> u32 {
                    self.frame
                }

                fn set_frame(&mut self, frame: u32) {
                    self.frame = frame;
                }
            }
        )*
    };
}

impl_keyframe!(BoneKey, MorphKey, CameraKey, LightKey, ShadowKey, PropertyKey);
