//! Synthetic model shared by the integration tests

#![allow(dead_code)]

use glam::{Quat, Vec2, Vec3, Vec4};
use mmd_model::*;

/// A small rig: three bones in a chain, one IK bone, two rigid bodies and
/// a joint, a quad split into two triangles and a couple of morphs
pub fn sample_document() -> ModelDocument {
    let vertices = (0..4)
        .map(|i| Vertex {
            position: Vec3::new((i % 2) as f32, (i / 2) as f32 * 10.0, 0.0),
            normal: Vec3::NEG_Z,
            uv: Vec2::new((i % 2) as f32, (i / 2) as f32),
            additional_uvs: Vec::new(),
            skinning: Skinning::Bdef2 {
                bones: [Some(1), Some(2)],
                weight: 0.75,
            },
            edge_scale: 1.0,
        })
        .collect();

    let bones = vec![
        Bone {
            name: "センター".into(),
            name_en: "center".into(),
            position: Vec3::new(0.0, 8.0, 0.0),
            flags: BoneFlags::ROTATABLE
                | BoneFlags::TRANSLATABLE
                | BoneFlags::VISIBLE
                | BoneFlags::CONTROLLABLE,
            tail: BoneTail::Bone(Some(1)),
            ..Default::default()
        },
        Bone {
            name: "左腕".into(),
            name_en: "arm_L".into(),
            position: Vec3::new(1.0, 15.0, 0.0),
            parent: Some(0),
            flags: BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::CONTROLLABLE,
            tail: BoneTail::Offset(Vec3::new(2.0, 0.0, 0.0)),
            local_axes: Some(LocalAxes {
                x: Vec3::X,
                z: Vec3::Z,
            }),
            ..Default::default()
        },
        Bone {
            name: "左ひじ".into(),
            name_en: "elbow_L".into(),
            position: Vec3::new(3.0, 15.0, 0.0),
            parent: Some(1),
            transform_order: 1,
            flags: BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::AFTER_PHYSICS,
            tail: BoneTail::Bone(None),
            inherit: Some(InheritLink {
                parent: Some(1),
                weight: 0.5,
                rotation: true,
                translation: false,
            }),
            ..Default::default()
        },
        Bone {
            name: "左腕IK".into(),
            name_en: "arm_IK_L".into(),
            position: Vec3::new(3.0, 15.0, 0.0),
            parent: Some(0),
            flags: BoneFlags::ROTATABLE
                | BoneFlags::TRANSLATABLE
                | BoneFlags::VISIBLE
                | BoneFlags::CONTROLLABLE,
            tail: BoneTail::Offset(Vec3::ZERO),
            ik: Some(IkChain {
                target: Some(2),
                loop_count: 40,
                limit_angle: 0.5,
                links: vec![IkLink {
                    bone: Some(1),
                    limits: Some((Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 0.0))),
                }],
            }),
            ..Default::default()
        },
    ];

    let materials = vec![Material {
        name: "body".into(),
        name_en: "body".into(),
        diffuse: Vec4::new(1.0, 0.8, 0.8, 1.0),
        specular: Vec3::splat(0.1),
        specular_power: 5.0,
        ambient: Vec3::splat(0.5),
        flags: MaterialFlags::GROUND_SHADOW
            | MaterialFlags::SELF_SHADOW_MAP
            | MaterialFlags::SELF_SHADOW
            | MaterialFlags::EDGE,
        edge_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
        edge_size: 1.0,
        texture: Some(0),
        sphere_texture: Some(1),
        sphere_mode: SphereMode::Multiply,
        toon: Toon::Shared(2),
        memo: String::new(),
        index_count: 6,
    }];

    let morphs = vec![
        Morph {
            name: "あ".into(),
            name_en: "a".into(),
            panel: 3,
            offsets: MorphOffsets::Vertex(vec![
                VertexOffset {
                    vertex: 2,
                    offset: Vec3::new(0.0, -1.0, 0.0),
                },
                VertexOffset {
                    vertex: 3,
                    offset: Vec3::new(0.0, -1.0, 0.0),
                },
            ]),
        },
        Morph {
            name: "腕上げ".into(),
            name_en: "raise".into(),
            panel: 4,
            offsets: MorphOffsets::Bone(vec![BoneOffset {
                bone: Some(1),
                translation: Vec3::ZERO,
                rotation: Quat::from_rotation_z(0.5),
            }]),
        },
    ];

    let display_frames = vec![
        DisplayFrame {
            name: "Root".into(),
            name_en: "Root".into(),
            special: true,
            items: vec![FrameItem::Bone(Some(0))],
        },
        DisplayFrame {
            name: "表情".into(),
            name_en: "Exp".into(),
            special: true,
            items: vec![FrameItem::Morph(Some(0))],
        },
        DisplayFrame {
            name: "腕".into(),
            name_en: "arms".into(),
            special: false,
            items: vec![FrameItem::Bone(Some(1)), FrameItem::Bone(Some(2))],
        },
    ];

    let rigid_bodies = vec![
        RigidBody {
            name: "腕".into(),
            bone: Some(1),
            group: 2,
            non_collision_mask: 1 << 2,
            shape: RigidShape::Capsule,
            size: Vec3::new(0.5, 2.0, 0.0),
            position: Vec3::new(2.0, 15.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            mass: 1.0,
            linear_damping: 0.5,
            angular_damping: 0.5,
            restitution: 0.0,
            friction: 0.5,
            mode: PhysicsMode::FollowBone,
            ..Default::default()
        },
        RigidBody {
            name: "ひじ".into(),
            bone: Some(2),
            group: 3,
            non_collision_mask: 1 << 3,
            shape: RigidShape::Sphere,
            size: Vec3::new(0.5, 0.0, 0.0),
            position: Vec3::new(4.0, 15.0, 0.0),
            mass: 1.0,
            mode: PhysicsMode::Dynamic,
            ..Default::default()
        },
    ];

    let joints = vec![Joint {
        name: "腕_ひじ".into(),
        body_a: Some(0),
        body_b: Some(1),
        position: Vec3::new(3.0, 15.0, 0.0),
        linear_lower: Vec3::ZERO,
        linear_upper: Vec3::ZERO,
        angular_lower: Vec3::new(-0.5, -0.5, -0.5),
        angular_upper: Vec3::new(0.5, 0.5, 0.5),
        spring_angular: Vec3::new(10.0, 0.0, 0.0),
        ..Default::default()
    }];

    ModelDocument {
        format: ModelFormat::default(),
        info: ModelInfo {
            name: "テスト".into(),
            name_en: "test".into(),
            comment: "コメント".into(),
            comment_en: "comment".into(),
        },
        vertices,
        faces: vec![[0, 1, 2], [2, 1, 3]],
        textures: vec!["body.png".into(), "metal.sph".into()],
        materials,
        bones,
        morphs,
        display_frames,
        rigid_bodies,
        joints,
        toon_textures: Vec::new(),
    }
}
