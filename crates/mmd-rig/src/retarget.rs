//! Motion document onto a rig graph

use mmd_motion::{BezierCurve, ChannelKind, MotionDocument};

use crate::curve::{AnimationCurve, SteppedCurve};
use crate::error::{Result, RigError, RigWarning, Warnings};
use crate::graph::RigGraph;
use crate::options::RetargetOptions;

/// Curves driving one rig bone
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneCurves {
    pub bone: usize,
    pub name: String,
    /// Host X, Y and Z offset from the rest position
    pub location: [AnimationCurve; 3],
    /// Quaternion W, X, Y and Z
    pub rotation: [AnimationCurve; 4],
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MorphCurve {
    /// Position in [`RigGraph::morphs`]
    pub morph: usize,
    pub name: String,
    pub weight: AnimationCurve,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct CameraCurves {
    pub distance: AnimationCurve,
    pub target: [AnimationCurve; 3],
    /// Euler angles in radians, as an axial vector in host space
    pub rotation: [AnimationCurve; 3],
    /// Vertical field of view in degrees
    pub fov: AnimationCurve,
    pub perspective: SteppedCurve<bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LightCurves {
    pub color: [AnimationCurve; 3],
    pub direction: [AnimationCurve; 3],
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ShadowCurves {
    pub mode: SteppedCurve<u8>,
    pub distance: AnimationCurve,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct IkCurve {
    pub bone: usize,
    pub name: String,
    pub enabled: SteppedCurve<bool>,
}

/// Host-ready curves produced by [`retarget`]
#[derive(Debug, Clone, Default)]
pub struct Retargeted {
    pub bones: Vec<BoneCurves>,
    pub morphs: Vec<MorphCurve>,
    pub camera: Option<CameraCurves>,
    pub light: Option<LightCurves>,
    pub shadow: Option<ShadowCurves>,
    pub visibility: SteppedCurve<bool>,
    pub ik: Vec<IkCurve>,
    /// First and last frame carrying a key, margin included
    pub frame_range: Option<(u32, u32)>,
    pub frame_rate: f32,
    pub warnings: Warnings,
}

impl Retargeted {
    pub fn bone_curves(&self, name: &str) -> Option<&BoneCurves> {
        self.bones.iter().find(|c| c.name == name)
    }

    pub fn morph_curve(&self, name: &str) -> Option<&MorphCurve> {
        self.morphs.iter().find(|c| c.name == name)
    }

    /// Playback length in seconds at the host frame rate
    pub fn duration(&self) -> Option<f32> {
        self.frame_range
            .map(|(first, last)| (last - first) as f32 / self.frame_rate)
    }
}

#[derive(Default)]
struct FrameSpan(Option<(u32, u32)>);

impl FrameSpan {
    fn add(&mut self, frame: u32) {
        self.0 = Some(match self.0 {
            Some((lo, hi)) => (lo.min(frame), hi.max(frame)),
            None => (frame, frame),
        });
    }
}

/// Bind a motion to a rig by exact channel name and convert every key to
/// host space.
///
/// Channels naming nothing in the rig are skipped and recorded as
/// [`RigWarning::NameBindingMiss`]. Frames are shifted by
/// `options.frame_margin`; interpolation curves are carried over unchanged.
/// A margin that would push the last key past `u32::MAX` is rejected.
pub fn retarget(
    motion: &MotionDocument,
    graph: &RigGraph,
    options: &RetargetOptions,
) -> Result<Retargeted> {
    options.validate()?;
    let host = options.convention;
    let scale = options.scale;
    let margin = options.frame_margin;
    if let Some((_, last)) = motion.frame_range()
        && last.checked_add(margin).is_none()
    {
        return Err(RigError::InvalidOption {
            name: "frame_margin",
            reason: format!("shifting frame {last} by {margin} overflows the frame counter"),
        });
    }
    let shift = |frame: u32| frame + margin;

    let mut warnings = Warnings::new();
    let mut span = FrameSpan::default();
    let mut out = Retargeted {
        frame_rate: options.frame_rate,
        ..Default::default()
    };

    for (name, track) in motion.bones.iter() {
        let Some(bone) = graph.find_bone(name) else {
            warnings.push(RigWarning::NameBindingMiss {
                channel: ChannelKind::Bone,
                name: name.to_string(),
            });
            continue;
        };
        let mut curves = BoneCurves {
            bone,
            name: name.to_string(),
            ..Default::default()
        };
        let mut previous: Option<glam::Quat> = None;
        for key in track {
            let frame = shift(key.frame);
            span.add(frame);
            let source = key.interpolation.curves();
            let location = host.convert_vec(key.position * scale);
            for axis in 0..3 {
                curves.location[axis].push(frame, location[axis], source[host.source_axis(axis)]);
            }

            let mut rotation = host.convert_quat(key.rotation);
            // Keep consecutive quaternions in the same hemisphere
            if previous.is_some_and(|p| p.dot(rotation) < 0.0) {
                rotation = -rotation;
            }
            previous = Some(rotation);
            let rotation_curve = key.interpolation.rotation;
            for (curve, value) in curves
                .rotation
                .iter_mut()
                .zip([rotation.w, rotation.x, rotation.y, rotation.z])
            {
                curve.push(frame, value, rotation_curve);
            }
        }
        out.bones.push(curves);
    }

    for (name, track) in motion.morphs.iter() {
        let Some(morph) = graph.find_morph(name) else {
            warnings.push(RigWarning::NameBindingMiss {
                channel: ChannelKind::Morph,
                name: name.to_string(),
            });
            continue;
        };
        let mut weight = AnimationCurve::default();
        for key in track {
            let frame = shift(key.frame);
            span.add(frame);
            weight.push(frame, key.weight, BezierCurve::LINEAR);
        }
        out.morphs.push(MorphCurve {
            morph,
            name: name.to_string(),
            weight,
        });
    }

    if !motion.camera.is_empty() {
        let mut camera = CameraCurves::default();
        for key in &motion.camera {
            let frame = shift(key.frame);
            span.add(frame);
            let [x, y, z, rotation, distance, fov] = key.interpolation.curves();
            let source = [x, y, z];
            camera.distance.push(frame, key.distance * scale, distance);
            let target = host.convert_vec(key.target * scale);
            let angles = host.convert_axial(key.rotation);
            for axis in 0..3 {
                camera.target[axis].push(frame, target[axis], source[host.source_axis(axis)]);
                camera.rotation[axis].push(frame, angles[axis], rotation);
            }
            camera.fov.push(frame, key.fov as f32, fov);
            camera.perspective.push(frame, key.perspective);
        }
        out.camera = Some(camera);
    }

    if !motion.lights.is_empty() {
        let mut light = LightCurves::default();
        for key in &motion.lights {
            let frame = shift(key.frame);
            span.add(frame);
            let direction = host.convert_vec(key.direction);
            for axis in 0..3 {
                light.color[axis].push(frame, key.color[axis], BezierCurve::LINEAR);
                light.direction[axis].push(frame, direction[axis], BezierCurve::LINEAR);
            }
        }
        out.light = Some(light);
    }

    if !motion.shadows.is_empty() {
        let mut shadow = ShadowCurves::default();
        for key in &motion.shadows {
            let frame = shift(key.frame);
            span.add(frame);
            shadow.mode.push(frame, key.mode);
            shadow.distance.push(frame, key.distance, BezierCurve::LINEAR);
        }
        out.shadow = Some(shadow);
    }

    for key in &motion.properties {
        let frame = shift(key.frame);
        span.add(frame);
        out.visibility.push(frame, key.visible);
    }
    for name in motion.ik_names() {
        let Some(bone) = graph.find_bone(name) else {
            warnings.push(RigWarning::NameBindingMiss {
                channel: ChannelKind::Ik,
                name: name.to_string(),
            });
            continue;
        };
        let mut enabled = SteppedCurve::default();
        for (frame, state) in motion.ik_track(name) {
            enabled.push(shift(frame), state);
        }
        out.ik.push(IkCurve {
            bone,
            name: name.to_string(),
            enabled,
        });
    }

    out.frame_range = span.0;
    out.warnings = warnings;
    log::debug!(
        "Retargeted {} bone and {} morph channel(s) onto '{}', frames {:?}",
        out.bones.len(),
        out.morphs.len(),
        graph.name,
        out.frame_range
    );
    Ok(out)
}

/// Retarget options matching the scale and convention `graph` was assembled with
pub fn options_for(graph: &RigGraph, frame_margin: u32, frame_rate: f32) -> RetargetOptions {
    RetargetOptions {
        scale: graph.scale,
        frame_margin,
        convention: graph.convention,
        frame_rate,
    }
}
