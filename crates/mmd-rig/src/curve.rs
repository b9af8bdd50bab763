//! Host animation curves

use glam::Vec2;
use mmd_motion::BezierCurve;
use mmd_motion::interpolation::CURVE_MAX;

/// One key of a float curve
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveKey {
    pub frame: u32,
    pub value: f32,
    /// Easing from the previous key into this one
    pub interpolation: BezierCurve,
}

impl CurveKey {
    /// Easing handles normalised to the unit square
    pub fn handles(&self) -> (Vec2, Vec2) {
        let max = f32::from(CURVE_MAX);
        let c = self.interpolation;
        (
            Vec2::new(f32::from(c.x1), f32::from(c.y1)) / max,
            Vec2::new(f32::from(c.x2), f32::from(c.y2)) / max,
        )
    }
}

/// Keys of a float property, frames ascending
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationCurve {
    pub keys: Vec<CurveKey>,
}

impl AnimationCurve {
    pub fn push(&mut self, frame: u32, value: f32, interpolation: BezierCurve) {
        self.keys.push(CurveKey {
            frame,
            value,
            interpolation,
        });
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn frames(&self) -> Vec<u32> {
        self.keys.iter().map(|k| k.frame).collect()
    }

    /// Value at `frame`, eased between the surrounding keys
    pub fn evaluate(&self, frame: f32) -> Option<f32> {
        let first = self.keys.first()?;
        if frame <= first.frame as f32 {
            return Some(first.value);
        }
        let next = self
            .keys
            .iter()
            .position(|k| k.frame as f32 > frame)
            .unwrap_or(self.keys.len());
        if next == self.keys.len() {
            return self.keys.last().map(|k| k.value);
        }
        let (a, b) = (&self.keys[next - 1], &self.keys[next]);
        let t = (frame - a.frame as f32) / (b.frame - a.frame) as f32;
        let eased = b.interpolation.evaluate(t);
        Some(a.value + (b.value - a.value) * eased)
    }
}

/// Keys of a discrete property; each value holds until the next key
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct SteppedCurve<T> {
    pub keys: Vec<(u32, T)>,
}

impl<T> Default for SteppedCurve<T> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<T: Copy> SteppedCurve<T> {
    pub fn push(&mut self, frame: u32, value: T) {
        self.keys.push((frame, value));
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn value_at(&self, frame: u32) -> Option<T> {
        self.keys
            .iter()
            .take_while(|(f, _)| *f <= frame)
            .last()
            .map(|(_, v)| *v)
    }

    pub fn frames(&self) -> Vec<u32> {
        self.keys.iter().map(|(f, _)| *f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_evaluation() {
        let mut curve = AnimationCurve::default();
        assert_eq!(curve.evaluate(3.0), None);

        curve.push(10, 0.0, BezierCurve::LINEAR);
        curve.push(20, 2.0, BezierCurve::LINEAR);
        assert_eq!(curve.evaluate(0.0), Some(0.0));
        assert!((curve.evaluate(15.0).unwrap() - 1.0).abs() < 1e-3);
        assert_eq!(curve.evaluate(40.0), Some(2.0));
    }

    #[test]
    fn test_handles() {
        let key = CurveKey {
            frame: 0,
            value: 0.0,
            interpolation: BezierCurve::new(0, 127, 127, 0),
        };
        assert_eq!(key.handles(), (Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_stepped_value() {
        let mut curve = SteppedCurve::default();
        curve.push(5, true);
        curve.push(20, false);
        assert_eq!(curve.value_at(0), None);
        assert_eq!(curve.value_at(5), Some(true));
        assert_eq!(curve.value_at(19), Some(true));
        assert_eq!(curve.value_at(25), Some(false));
    }
}
