//! Hand-off of rigs and motions to a recording scene host

mod common;

use common::*;
use glam::{Quat, Vec3};
use mmd_motion::*;
use mmd_rig::*;
use pretty_assertions::assert_eq;
use std::result::Result;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Skeleton { name: String, bones: usize, order: Vec<usize> },
    Mesh { vertices: usize, faces: usize },
    RigidBody(String),
    Joint(String),
    Exclude(usize, usize),
    Curve(CurveTarget, usize),
    Switch(SwitchTarget, usize),
    ShadowMode(usize),
    FrameRange(u32, u32),
}

struct RecordingHost {
    convention: HostConvention,
    calls: Vec<Call>,
    fail_on_joint: bool,
}

impl RecordingHost {
    fn new(convention: HostConvention) -> Self {
        Self {
            convention,
            calls: Vec::new(),
            fail_on_joint: false,
        }
    }
}

impl SceneHost for RecordingHost {
    type Error = String;

    fn convention(&self) -> HostConvention {
        self.convention
    }

    fn frame_rate(&self) -> f32 {
        60.0
    }

    fn create_skeleton(
        &mut self,
        name: &str,
        bones: &[RigBone],
        order: &EvaluationOrder,
    ) -> Result<(), String> {
        self.calls.push(Call::Skeleton {
            name: name.to_string(),
            bones: bones.len(),
            order: order.iter().collect(),
        });
        Ok(())
    }

    fn create_mesh(&mut self, mesh: &RigMesh) -> Result<(), String> {
        self.calls.push(Call::Mesh {
            vertices: mesh.positions.len(),
            faces: mesh.faces.len(),
        });
        Ok(())
    }

    fn create_rigid_body(&mut self, body: &RigidBodyBinding) -> Result<(), String> {
        self.calls.push(Call::RigidBody(body.name.clone()));
        Ok(())
    }

    fn create_joint(&mut self, joint: &JointBinding) -> Result<(), String> {
        if self.fail_on_joint {
            return Err(format!("cannot create {}", joint.name));
        }
        self.calls.push(Call::Joint(joint.name.clone()));
        Ok(())
    }

    fn exclude_collision(&mut self, pair: &NonCollisionPair) -> Result<(), String> {
        self.calls.push(Call::Exclude(pair.a, pair.b));
        Ok(())
    }

    fn create_curve(&mut self, target: CurveTarget, curve: &AnimationCurve) -> Result<(), String> {
        self.calls.push(Call::Curve(target, curve.len()));
        Ok(())
    }

    fn create_switch(
        &mut self,
        target: SwitchTarget,
        curve: &SteppedCurve<bool>,
    ) -> Result<(), String> {
        self.calls.push(Call::Switch(target, curve.keys.len()));
        Ok(())
    }

    fn create_shadow_mode(&mut self, curve: &SteppedCurve<u8>) -> Result<(), String> {
        self.calls.push(Call::ShadowMode(curve.keys.len()));
        Ok(())
    }

    fn set_frame_range(&mut self, first: u32, last: u32) -> Result<(), String> {
        self.calls.push(Call::FrameRange(first, last));
        Ok(())
    }
}

#[test]
fn test_options_follow_the_host() {
    let host = RecordingHost::new(HostConvention::RightHandedYUp);
    let assemble_options = AssembleOptions::for_host(&host);
    assert_eq!(assemble_options.convention, HostConvention::RightHandedYUp);
    assert_eq!(assemble_options.scale, DEFAULT_SCALE);

    let retarget_options = RetargetOptions::for_host(&host);
    assert_eq!(retarget_options.convention, HostConvention::RightHandedYUp);
    assert_eq!(retarget_options.frame_rate, 60.0);
}

#[test]
fn test_build_scene_order() {
    let mut host = RecordingHost::new(HostConvention::RightHandedZUp);
    let options = AssembleOptions {
        ignore_non_collision_groups: true,
        ..AssembleOptions::for_host(&host)
    };
    let graph = assemble(&rig_document(), &options).unwrap().graph;
    let expected_order: Vec<usize> = graph.evaluation_order.iter().collect();
    let pairs = graph.non_collision_pairs.len();
    let name = graph.name.clone();

    build_scene(&mut host, graph).unwrap();

    assert_eq!(
        host.calls[0],
        Call::Skeleton {
            name,
            bones: 6,
            order: expected_order,
        }
    );
    assert_eq!(host.calls[1], Call::Mesh { vertices: 3, faces: 1 });

    let kinds: Vec<u8> = host
        .calls
        .iter()
        .map(|call| match call {
            Call::Skeleton { .. } => 0,
            Call::Mesh { .. } => 1,
            Call::RigidBody(_) => 2,
            Call::Joint(_) => 3,
            Call::Exclude(..) => 4,
            _ => 9,
        })
        .collect();
    let mut sorted = kinds.clone();
    sorted.sort();
    assert_eq!(kinds, sorted);
    assert_eq!(kinds.iter().filter(|&&k| k == 2).count(), 4);
    assert_eq!(kinds.iter().filter(|&&k| k == 3).count(), 3);
    assert_eq!(kinds.iter().filter(|&&k| k == 4).count(), pairs);
    assert!(pairs >= 1);
}

#[test]
fn test_build_scene_stops_on_host_error() {
    let mut host = RecordingHost::new(HostConvention::RightHandedZUp);
    host.fail_on_joint = true;
    let graph = assemble(&rig_document(), &AssembleOptions::default())
        .unwrap()
        .graph;

    let err = build_scene(&mut host, graph).unwrap_err();
    assert_eq!(err, "cannot create 髪1-髪2");
    assert!(!host.calls.iter().any(|c| matches!(c, Call::Joint(_) | Call::Exclude(..))));
}

#[test]
fn test_apply_motion_creates_every_curve() {
    let mut host = RecordingHost::new(HostConvention::RightHandedZUp);
    let graph = assemble(&rig_document(), &AssembleOptions::for_host(&host))
        .unwrap()
        .graph;

    let mut motion = MotionDocument::default();
    for frame in [0, 30] {
        motion.bones.insert(
            "首",
            BoneKey {
                frame,
                position: Vec3::new(0.0, frame as f32, 0.0),
                rotation: Quat::IDENTITY,
                ..Default::default()
            },
        );
    }
    motion.morphs.insert("あ", MorphKey { frame: 10, weight: 0.5 });
    motion.shadows.insert(ShadowKey {
        frame: 0,
        mode: 2,
        distance: 0.02,
    });
    motion.properties.insert(PropertyKey {
        frame: 0,
        visible: true,
        ik_states: vec![IkState {
            name: "右足ＩＫ".into(),
            enabled: true,
        }],
    });

    let retargeted = retarget(&motion, &graph, &RetargetOptions::for_host(&host)).unwrap();
    apply_motion(&mut host, retargeted).unwrap();

    let mut expected = Vec::new();
    for axis in 0..3 {
        expected.push(Call::Curve(CurveTarget::BoneLocation { bone: NECK, axis }, 2));
    }
    for component in 0..4 {
        expected.push(Call::Curve(
            CurveTarget::BoneRotation {
                bone: NECK,
                component,
            },
            2,
        ));
    }
    expected.push(Call::Curve(CurveTarget::MorphWeight { morph: 0 }, 1));
    expected.push(Call::Curve(CurveTarget::ShadowDistance, 1));
    expected.push(Call::ShadowMode(1));
    expected.push(Call::Switch(SwitchTarget::ModelVisible, 1));
    expected.push(Call::Switch(SwitchTarget::IkEnabled { bone: LEG_IK }, 1));
    expected.push(Call::FrameRange(5, 35));
    assert_eq!(host.calls, expected);
}

#[test]
fn test_camera_motion_targets() {
    let mut host = RecordingHost::new(HostConvention::LeftHandedYUp);
    let graph = assemble(&rig_document(), &AssembleOptions::for_host(&host))
        .unwrap()
        .graph;
    let mut motion = MotionDocument {
        model_name: CAMERA_MODEL_NAME.into(),
        ..Default::default()
    };
    motion.camera.insert(CameraKey::default());
    motion.lights.insert(LightKey::default());

    let retargeted = retarget(&motion, &graph, &RetargetOptions::for_host(&host)).unwrap();
    apply_motion(&mut host, retargeted).unwrap();

    let curves = host
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Curve(..)))
        .count();
    // distance, target, rotation, fov, light color, light direction
    assert_eq!(curves, 1 + 3 + 3 + 1 + 3 + 3);
    assert!(host
        .calls
        .contains(&Call::Switch(SwitchTarget::CameraPerspective, 1)));
    assert!(!host
        .calls
        .iter()
        .any(|c| matches!(c, Call::Switch(SwitchTarget::ModelVisible, _))));
    assert_eq!(host.calls.last(), Some(&Call::FrameRange(5, 5)));
}
