//! Coordinate conventions of host scene graphs
//!
//! Model and motion files are authored in a left-handed, Y-up space. A host
//! declares its own convention and every position, rotation, axis frame and
//! limit range passes through the same signed axis permutation on the way
//! in and on the way out.
//!
//! ```
//! use glam::Vec3;
//! use mmd_rig::HostConvention;
//!
//! let host = HostConvention::RightHandedZUp;
//! let p = Vec3::new(1.0, 2.0, 3.0);
//! assert_eq!(host.convert_vec(p), Vec3::new(1.0, 3.0, 2.0));
//! assert_eq!(host.convert_vec(host.convert_vec(p)), p);
//! ```

use glam::{EulerRot, Mat3, Quat, Vec3};

/// Handedness and up axis of a host scene graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum HostConvention {
    /// Same space as the files: X right, Y up, Z forward
    LeftHandedYUp,
    /// X right, Y up, Z toward the viewer
    RightHandedYUp,
    /// X right, Y forward, Z up
    #[default]
    RightHandedZUp,
}

impl HostConvention {
    pub const ALL: [Self; 3] = [
        Self::LeftHandedYUp,
        Self::RightHandedYUp,
        Self::RightHandedZUp,
    ];

    /// Signed permutation taking file space to host space.
    ///
    /// Every basis is symmetric, so it is its own inverse.
    pub fn basis(self) -> Mat3 {
        match self {
            Self::LeftHandedYUp => Mat3::IDENTITY,
            Self::RightHandedYUp => Mat3::from_diagonal(Vec3::new(1.0, 1.0, -1.0)),
            Self::RightHandedZUp => Mat3::from_cols(Vec3::X, Vec3::Z, Vec3::Y),
        }
    }

    /// Whether the conversion flips handedness
    pub fn is_mirroring(self) -> bool {
        self.basis().determinant() < 0.0
    }

    fn handedness(self) -> f32 {
        if self.is_mirroring() { -1.0 } else { 1.0 }
    }

    /// Position or direction
    pub fn convert_vec(self, v: Vec3) -> Vec3 {
        self.basis() * v
    }

    /// Axial vector, such as a rotation axis or an angular range
    pub fn convert_axial(self, v: Vec3) -> Vec3 {
        self.basis() * v * self.handedness()
    }

    pub fn convert_quat(self, q: Quat) -> Quat {
        let axis = self.convert_axial(Vec3::new(q.x, q.y, q.z));
        Quat::from_xyzw(axis.x, axis.y, axis.z, q.w)
    }

    /// Euler angles in file order (Y, then X, then Z) to a host rotation
    pub fn convert_euler(self, euler: Vec3) -> Quat {
        self.convert_quat(euler_to_quat(euler))
    }

    /// Host rotation back to Euler angles in file order
    pub fn euler_from_host(self, rotation: Quat) -> Vec3 {
        quat_to_euler(self.convert_quat(rotation))
    }

    /// File axis that feeds host axis `axis`
    pub fn source_axis(self, axis: usize) -> usize {
        let basis = self.basis();
        (0..3)
            .find(|&j| basis.col(j)[axis] != 0.0)
            .unwrap_or(axis)
    }

    /// Extent along each axis, with the sign dropped
    pub fn convert_extent(self, v: Vec3) -> Vec3 {
        self.convert_vec(v).abs()
    }

    /// Per-axis `(lower, upper)` range of a positional quantity
    pub fn convert_range(self, lower: Vec3, upper: Vec3) -> (Vec3, Vec3) {
        permute_range(self.basis(), lower, upper)
    }

    /// Per-axis `(lower, upper)` range of an angular quantity
    pub fn convert_angular_range(self, lower: Vec3, upper: Vec3) -> (Vec3, Vec3) {
        permute_range(self.basis() * self.handedness(), lower, upper)
    }
}

/// A negated axis swaps and negates its bounds so `lower <= upper` keeps holding
fn permute_range(basis: Mat3, lower: Vec3, upper: Vec3) -> (Vec3, Vec3) {
    let sign = basis * Vec3::ONE;
    let a = basis * lower;
    let b = basis * upper;
    let positive = sign.cmpgt(Vec3::ZERO);
    (Vec3::select(positive, a, b), Vec3::select(positive, b, a))
}

/// File Euler angles, applied Y then X then Z
pub fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z)
}

pub fn quat_to_euler(q: Quat) -> Vec3 {
    let (y, x, z) = q.to_euler(EulerRot::YXZ);
    Vec3::new(x, y, z)
}
