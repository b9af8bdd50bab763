//! Synthetic rig shared by the integration tests

#![allow(dead_code)]

use glam::{Quat, Vec2, Vec3};
use mmd_model::*;

pub const CENTER: usize = 0;
pub const UPPER_BODY: usize = 1;
pub const NECK: usize = 2;
pub const ARM: usize = 3;
pub const ELBOW: usize = 4;
pub const LEG_IK: usize = 5;

fn bone(name: &str, position: Vec3, parent: Option<u32>, tail: BoneTail) -> Bone {
    Bone {
        name: name.into(),
        position,
        parent,
        tail,
        flags: BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::CONTROLLABLE,
        ..Default::default()
    }
}

fn body(name: &str, bone: Option<u32>, group: u8, position: Vec3) -> RigidBody {
    RigidBody {
        name: name.into(),
        bone,
        group,
        shape: RigidShape::Sphere,
        size: Vec3::new(0.5, 0.0, 0.0),
        position,
        mass: 0.5,
        linear_damping: 0.5,
        angular_damping: 0.5,
        friction: 0.5,
        mode: PhysicsMode::Dynamic,
        ..Default::default()
    }
}

fn joint(name: &str, a: u32, b: u32, position: Vec3) -> Joint {
    Joint {
        name: name.into(),
        body_a: Some(a),
        body_b: Some(b),
        position,
        rotation: Vec3::new(0.0, 0.3, 0.0),
        linear_lower: Vec3::new(-0.5, 0.0, -1.0),
        linear_upper: Vec3::new(0.5, 0.25, 0.0),
        angular_lower: Vec3::new(-0.2, -0.4, -0.6),
        angular_upper: Vec3::new(0.1, 0.3, 0.5),
        spring_linear: Vec3::ZERO,
        spring_angular: Vec3::new(10.0, 0.0, 5.0),
        ..Default::default()
    }
}

/// Six bones with an IK chain and a bone evaluated after physics, one
/// skinned triangle, two morphs, four rigid bodies and three joints.
///
/// Body 2 masks out group 3 (body 1). Bodies 1 and 3 rest 2.0 apart and are
/// jointed; bodies 0 and 1 rest about 1.41 apart and are jointed. Body 0
/// follows its bone and body 3 is free.
pub fn rig_document() -> ModelDocument {
    let mut bones = vec![
        bone("センター", Vec3::new(0.0, 8.0, 0.0), None, BoneTail::Offset(Vec3::new(0.0, -2.0, 0.0))),
        bone("上半身", Vec3::new(0.0, 10.0, 0.0), Some(0), BoneTail::Bone(Some(2))),
        bone("首", Vec3::new(0.0, 15.0, 0.0), Some(1), BoneTail::Offset(Vec3::new(0.0, 1.0, 0.5))),
        bone("左腕", Vec3::new(2.0, 14.0, 0.0), Some(1), BoneTail::Bone(Some(4))),
        bone("左ひじ", Vec3::new(4.0, 12.0, 0.5), Some(3), BoneTail::Bone(None)),
        bone("右足ＩＫ", Vec3::new(-1.0, 1.0, 0.0), Some(0), BoneTail::Offset(Vec3::new(0.0, 0.0, 1.0))),
    ];
    bones[ARM].local_axes = Some(LocalAxes {
        x: Vec3::new(0.8, -0.6, 0.0),
        z: Vec3::Z,
    });
    bones[ELBOW].transform_order = 1;
    bones[ELBOW].flags |= BoneFlags::AFTER_PHYSICS;
    bones[ELBOW].fixed_axis = Some(Vec3::new(0.6, 0.8, 0.0));
    bones[LEG_IK].transform_order = 2;
    bones[LEG_IK].ik = Some(IkChain {
        target: Some(ELBOW as u32),
        loop_count: 40,
        limit_angle: 0.5,
        links: vec![IkLink {
            bone: Some(ARM as u32),
            limits: Some((Vec3::new(-1.0, 0.0, -0.25), Vec3::new(0.0, 0.5, 0.25))),
        }],
    });

    let vertices = vec![
        Vertex {
            position: Vec3::new(0.0, 10.0, 0.0),
            normal: Vec3::NEG_Z,
            uv: Vec2::new(0.0, 0.0),
            skinning: Skinning::Bdef1 { bone: Some(1) },
            edge_scale: 1.0,
            ..Default::default()
        },
        Vertex {
            position: Vec3::new(2.0, 14.0, 0.0),
            normal: Vec3::NEG_Z,
            uv: Vec2::new(1.0, 0.0),
            skinning: Skinning::Bdef2 {
                bones: [Some(3), Some(4)],
                weight: 0.25,
            },
            edge_scale: 1.0,
            ..Default::default()
        },
        Vertex {
            position: Vec3::new(0.0, 15.0, 1.0),
            normal: Vec3::Y,
            uv: Vec2::new(0.0, 1.0),
            skinning: Skinning::Bdef1 { bone: Some(2) },
            edge_scale: 1.0,
            ..Default::default()
        },
    ];

    let materials = vec![Material {
        name: "肌".into(),
        diffuse: glam::Vec4::ONE,
        texture: Some(0),
        flags: MaterialFlags::DOUBLE_SIDED,
        index_count: 3,
        ..Default::default()
    }];

    let morphs = vec![
        Morph {
            name: "あ".into(),
            panel: 3,
            offsets: MorphOffsets::Vertex(vec![VertexOffset {
                vertex: 1,
                offset: Vec3::new(0.0, 1.0, 2.0),
            }]),
            ..Default::default()
        },
        Morph {
            name: "笑い".into(),
            panel: 4,
            offsets: MorphOffsets::Bone(vec![BoneOffset {
                bone: Some(NECK as u32),
                translation: Vec3::ZERO,
                rotation: Quat::from_rotation_x(0.2),
            }]),
            ..Default::default()
        },
    ];

    let mut head = body("頭", Some(2), 0, Vec3::new(0.0, 15.0, 0.0));
    head.mode = PhysicsMode::FollowBone;
    head.mass = 1.0;
    let mut hair1 = body("髪1", Some(2), 3, Vec3::new(0.0, 16.0, -1.0));
    hair1.shape = RigidShape::Box;
    hair1.size = Vec3::new(0.5, 1.0, 0.25);
    hair1.rotation = Vec3::new(0.1, 0.2, 0.3);
    let mut hair2 = body("髪2", Some(2), 4, Vec3::new(0.0, 18.0, -1.0));
    hair2.shape = RigidShape::Capsule;
    hair2.size = Vec3::new(0.25, 2.0, 0.0);
    hair2.non_collision_mask = 1 << 3;
    let hair3 = body("髪3", None, 5, Vec3::new(0.0, 16.0, -3.0));

    let joints = vec![
        joint("髪1-髪2", 1, 2, Vec3::new(0.0, 17.0, -1.0)),
        joint("頭-髪1", 0, 1, Vec3::new(0.0, 15.5, -0.5)),
        joint("髪1-髪3", 1, 3, Vec3::new(0.0, 16.0, -2.0)),
    ];

    ModelDocument {
        info: ModelInfo {
            name: "テスト".into(),
            ..Default::default()
        },
        vertices,
        faces: vec![[0, 1, 2]],
        textures: vec!["skin.png".into()],
        materials,
        bones,
        morphs,
        rigid_bodies: vec![head, hair1, hair2, hair3],
        joints,
        ..Default::default()
    }
}
