//! Bezier easing curves attached to motion keys

/// Cubic easing curve from (0, 0) to (127, 127) with two control points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BezierCurve {
    pub x1: u8,
    pub y1: u8,
    pub x2: u8,
    pub y2: u8,
}

/// Upper bound of the control point grid
pub const CURVE_MAX: u8 = 127;

impl Default for BezierCurve {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl BezierCurve {
    /// The curve MikuMikuDance writes for linear keys
    pub const LINEAR: Self = Self {
        x1: 20,
        y1: 20,
        x2: 107,
        y2: 107,
    };

    pub fn new(x1: u8, y1: u8, x2: u8, y2: u8) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Control points on the diagonal give constant speed
    pub fn is_linear(&self) -> bool {
        self.x1 == self.y1 && self.x2 == self.y2
    }

    /// Control points scaled to the unit square
    pub fn control_points(&self) -> [(f32, f32); 2] {
        let unit = |v: u8| v as f32 / CURVE_MAX as f32;
        [
            (unit(self.x1), unit(self.y1)),
            (unit(self.x2), unit(self.y2)),
        ]
    }

    /// Eased progress for linear progress `t` in `[0, 1]`
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if self.is_linear() {
            return t;
        }
        let [(x1, y1), (x2, y2)] = self.control_points();
        let bezier = |s: f32, p1: f32, p2: f32| {
            let inv = 1.0 - s;
            3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
        };

        // x(s) is monotonic for control points inside the unit square
        let (mut low, mut high) = (0.0f32, 1.0f32);
        let mut s = t;
        for _ in 0..32 {
            let x = bezier(s, x1, x2);
            if (x - t).abs() < 1e-6 {
                break;
            }
            if x < t {
                low = s;
            } else {
                high = s;
            }
            s = 0.5 * (low + high);
        }
        bezier(s, y1, y2)
    }
}

/// Index of the last key at or before `frame` in a sorted frame list
pub fn find_key_index(frames: &[u32], frame: u32) -> Option<usize> {
    match frames.binary_search(&frame) {
        Ok(index) => Some(index),
        Err(0) => None,
        Err(index) => Some(index - 1),
    }
}
