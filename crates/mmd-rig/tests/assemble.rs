//! Integration tests for rig assembly and export

mod common;

use common::*;
use glam::{Quat, Vec3};
use mmd_model::{BoneTail, ModelDocument, ModelFormat, RigidBody};
use mmd_rig::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn options(convention: HostConvention, scale: f32) -> AssembleOptions {
    AssembleOptions {
        scale,
        convention,
        ..Default::default()
    }
}

fn close(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, 1e-5 * b.abs().max_element().max(1.0))
}

#[test]
fn test_scale_and_axis_conversion() {
    let mut document = ModelDocument::default();
    document.bones = rig_document().bones;
    document.bones[CENTER].position = Vec3::new(0.0, 20.0, 0.0);
    document.bones[UPPER_BODY].position = Vec3::new(1.0, 25.0, 2.0);

    let graph = assemble(&document, &options(HostConvention::RightHandedYUp, 0.08))
        .unwrap()
        .graph;
    assert!(graph.bones[CENTER].head.abs_diff_eq(Vec3::new(0.0, 1.6, 0.0), 1e-6));
    assert!(graph.bones[UPPER_BODY].head.abs_diff_eq(Vec3::new(0.08, 2.0, -0.16), 1e-6));

    let graph = assemble(&document, &options(HostConvention::RightHandedZUp, 0.08))
        .unwrap()
        .graph;
    assert!(graph.bones[CENTER].head.abs_diff_eq(Vec3::new(0.0, 0.0, 1.6), 1e-6));
    assert!(graph.bones[UPPER_BODY].head.abs_diff_eq(Vec3::new(0.08, 0.16, 2.0), 1e-6));
}

#[test]
fn test_hierarchy_and_tags() {
    let assembly = assemble(&rig_document(), &AssembleOptions::default()).unwrap();
    assert!(assembly.warnings.is_empty(), "{}", assembly.warnings.format());
    let graph = assembly.graph;

    assert_eq!(graph.name, "テスト");
    assert_eq!(graph.roots(), vec![CENTER]);
    assert_eq!(graph.bones[UPPER_BODY].children, vec![NECK, ARM]);
    assert_eq!(graph.bones[CENTER].children, vec![UPPER_BODY, LEG_IK]);
    assert_eq!(graph.depths()[ELBOW], 3);

    // Tail pointing at a bone ends at that bone's head
    assert_eq!(graph.bones[UPPER_BODY].tail, graph.bones[NECK].head);
    assert!(graph.bones[ELBOW].is_tip);
    assert!(graph.bones[ELBOW].transform_after_dynamics);
    assert!(graph.bones[LEG_IK].is_ik);
    assert!(!graph.bones[NECK].is_ik);
    assert!(graph.bones[NECK].is_visible && graph.bones[NECK].is_controllable);

    let ik = graph.bones[LEG_IK].ik.as_ref().unwrap();
    assert_eq!(ik.target, ELBOW);
    assert_eq!(ik.links[0].bone, ARM);
    assert_eq!(ik.loop_count, 40);

    assert_eq!(graph.find_bone("左腕"), Some(ARM));
    assert_eq!(graph.find_bone("腕.L"), None);
    assert_eq!(graph.find_morph("笑い"), Some(1));
}

#[test]
fn test_rename_is_display_only() {
    let options = AssembleOptions {
        rename_bones: true,
        ..Default::default()
    };
    let graph = assemble(&rig_document(), &options).unwrap().graph;

    assert_eq!(graph.bones[ARM].name, "腕.L");
    assert_eq!(graph.bones[LEG_IK].name, "足ＩＫ.R");
    assert_eq!(graph.bones[ARM].source_name, "左腕");
    assert_eq!(graph.bones[ELBOW].parent, Some(ARM));
    assert_eq!(graph.find_bone("左腕"), Some(ARM));
}

#[test]
fn test_default_options_rename_and_hide() {
    let graph = assemble(&rig_document(), &AssembleOptions::default())
        .unwrap()
        .graph;
    assert_eq!(graph.bones[ARM].name, "腕.L");
    assert!(graph.rigid_bodies.iter().all(|b| b.hidden));
    assert!(graph.joints.iter().all(|j| j.hidden));

    let options = AssembleOptions {
        rename_bones: false,
        hide_rigids: false,
        ..Default::default()
    };
    let graph = assemble(&rig_document(), &options).unwrap().graph;
    assert_eq!(graph.bones[ARM].name, "左腕");
    assert!(graph.rigid_bodies.iter().all(|b| !b.hidden));
    assert!(!graph.joints.is_empty());
    assert!(graph.joints.iter().all(|j| !j.hidden));
}

#[test]
fn test_evaluation_order_respects_transform_order() {
    let document = rig_document();
    let graph = assemble(&document, &AssembleOptions::default())
        .unwrap()
        .graph;
    let order = &graph.evaluation_order;
    assert_eq!(order.before_dynamics, vec![CENTER, UPPER_BODY, NECK, ARM, LEG_IK]);
    assert_eq!(order.after_dynamics, vec![ELBOW]);

    let bones = &document.bones;
    for a in 0..bones.len() {
        for b in 0..bones.len() {
            let (pa, pb) = (order.position(a).unwrap(), order.position(b).unwrap());
            let same_pass = bones[a].transform_after_dynamics() == bones[b].transform_after_dynamics();
            if same_pass && bones[a].transform_order < bones[b].transform_order {
                assert!(pa < pb, "bone {a} must precede bone {b}");
            }
            if bones[a].transform_after_dynamics() && !bones[b].transform_after_dynamics() {
                assert!(pa > pb, "bone {a} runs after physics");
            }
        }
    }
}

#[test]
fn test_cycle_is_rejected() {
    let mut document = rig_document();
    document.bones[CENTER].parent = Some(NECK as u32);
    let err = assemble(&document, &AssembleOptions::default()).unwrap_err();
    assert!(matches!(err, RigError::CyclicHierarchy { .. }), "{err}");
}

#[test]
fn test_invalid_options_are_rejected() {
    let err = assemble(&rig_document(), &options(HostConvention::default(), 0.0)).unwrap_err();
    assert!(matches!(err, RigError::InvalidOption { name: "scale", .. }));
}

#[test]
fn test_masked_pair_never_collides() {
    let graph = assemble(&rig_document(), &AssembleOptions::default())
        .unwrap()
        .graph;
    assert_eq!(
        graph.non_collision_pairs,
        vec![NonCollisionPair {
            a: 1,
            b: 2,
            reason: PairReason::Mask,
        }]
    );
    assert!(graph.is_non_colliding(2, 1));
    assert!(!graph.is_non_colliding(1, 3));
}

#[rstest]
#[case::beyond_threshold(-3.0, true)]
#[case::at_threshold(-2.5, false)]
#[case::within_threshold(-2.0, false)]
fn test_distance_exclusion(#[case] z: f32, #[case] excluded: bool) {
    let mut document = rig_document();
    // Body 1 rests at z = -1, so body 3's z sets the separation
    document.rigid_bodies[3].position.z = z;
    let options = AssembleOptions {
        ignore_non_collision_groups: true,
        distance_of_ignore_collisions: 1.5,
        ..Default::default()
    };
    let graph = assemble(&document, &options).unwrap().graph;

    let distance_pairs: Vec<_> = graph
        .non_collision_pairs
        .iter()
        .filter(|p| p.reason == PairReason::Distance)
        .map(|p| (p.a, p.b))
        .collect();
    if excluded {
        assert_eq!(distance_pairs, vec![(1, 3)]);
    } else {
        assert!(distance_pairs.is_empty(), "{distance_pairs:?}");
    }
    // The masked pair keeps its reason and is not listed twice
    assert_eq!(graph.non_collision_pairs[0].reason, PairReason::Mask);
    assert!(graph.is_non_colliding(1, 2));
}

#[test]
fn test_distance_exclusion_is_off_by_default() {
    let graph = assemble(&rig_document(), &AssembleOptions::default())
        .unwrap()
        .graph;
    assert!(!graph.is_non_colliding(1, 3));
}

#[test]
fn test_only_collisions() {
    let options = AssembleOptions {
        only_collisions: true,
        hide_rigids: true,
        ..Default::default()
    };
    let graph = assemble(&rig_document(), &options).unwrap().graph;

    let sources: Vec<_> = graph.rigid_bodies.iter().map(|b| b.source).collect();
    assert_eq!(sources, vec![1, 2, 3]);
    assert!(graph.rigid_bodies.iter().all(|b| b.hidden));
    assert!(graph.rigid_bodies[2].is_free());

    // The joint to the bone-following body goes with it
    let joints: Vec<_> = graph.joints.iter().map(|j| (j.source, j.body_a, j.body_b)).collect();
    assert_eq!(joints, vec![(0, 0, 1), (2, 0, 2)]);
    assert!(graph.joints.iter().all(|j| j.hidden && j.is_spring));
    assert_eq!(graph.non_collision_pairs[0].a, 0);
    assert_eq!(graph.non_collision_pairs[0].b, 1);
}

#[test]
fn test_dangling_references_are_dropped() {
    let mut document = rig_document();
    document.rigid_bodies.push(RigidBody {
        name: "迷子".into(),
        bone: Some(99),
        ..Default::default()
    });
    document.joints[0].body_b = Some(40);
    document.bones[NECK].tail = BoneTail::Bone(Some(70));
    document.vertices[0].skinning = mmd_model::Skinning::Bdef2 {
        bones: [Some(1), Some(77)],
        weight: 0.5,
    };

    let assembly = assemble(&document, &AssembleOptions::default()).unwrap();
    let warnings = &assembly.warnings;
    assert_eq!(warnings.dangling_references(Entity::RigidBody), 1);
    assert_eq!(warnings.dangling_references(Entity::Joint), 1);
    assert_eq!(warnings.dangling_references(Entity::Bone), 1);
    assert_eq!(warnings.dangling_references(Entity::Vertex), 1);
    assert!(warnings.iter().any(|w| matches!(
        w,
        RigWarning::DanglingReference {
            entity: Entity::Joint,
            index: 0,
            field: "body_b",
            reference: 40,
        }
    )));

    let graph = assembly.graph;
    assert_eq!(graph.rigid_bodies.len(), 4);
    assert_eq!(graph.joints.len(), 2);
    assert_eq!(graph.bones[NECK].tail, graph.bones[NECK].head);
    assert_eq!(graph.mesh.weights[0], vec![(1, 1.0)]);
}

#[test]
fn test_mesh_payload() {
    let graph = assemble(&rig_document(), &options(HostConvention::RightHandedZUp, 0.5))
        .unwrap()
        .graph;
    let mesh = &graph.mesh;

    assert_eq!(mesh.positions[2], Vec3::new(0.0, 0.5, 7.5));
    assert_eq!(mesh.normals[2], Vec3::Z);
    // Mirroring conventions reverse the winding
    assert_eq!(mesh.faces, vec![[0, 2, 1]]);
    assert_eq!(mesh.weights[1], vec![(ARM, 0.25), (ELBOW, 0.75)]);

    assert_eq!(mesh.materials.len(), 1);
    assert_eq!(mesh.materials[0].face_count, 1);
    assert_eq!(mesh.materials[0].texture.as_deref(), Some("skin.png"));
    assert!(mesh.materials[0].double_sided);

    assert_eq!(mesh.morphs.len(), 1);
    assert_eq!(mesh.morphs[0].offsets, vec![(1, Vec3::new(0.0, 1.0, 0.5))]);

    let graph = assemble(&rig_document(), &options(HostConvention::LeftHandedYUp, 1.0))
        .unwrap()
        .graph;
    assert_eq!(graph.mesh.faces, vec![[0, 1, 2]]);
}

#[test]
fn test_physics_conversion() {
    let graph = assemble(&rig_document(), &options(HostConvention::RightHandedZUp, 0.5))
        .unwrap()
        .graph;

    let hair = &graph.rigid_bodies[1];
    assert_eq!(hair.position, Vec3::new(0.0, -0.5, 8.0));
    // Box extents follow the axis swap
    assert_eq!(hair.size, Vec3::new(0.25, 0.125, 0.5));
    let capsule = &graph.rigid_bodies[2];
    assert_eq!(capsule.size, Vec3::new(0.125, 1.0, 0.0));

    let joint = &graph.joints[0];
    assert_eq!(joint.linear_lower, Vec3::new(-0.25, -0.5, 0.0));
    assert_eq!(joint.linear_upper, Vec3::new(0.25, 0.0, 0.125));
    assert_eq!(joint.spring_angular, Vec3::new(10.0, 5.0, 0.0));
    assert!(joint.is_spring);
}

#[rstest]
fn test_export_reverses_assembly(
    #[values(
        HostConvention::LeftHandedYUp,
        HostConvention::RightHandedYUp,
        HostConvention::RightHandedZUp
    )]
    convention: HostConvention,
    #[values(1.0, 0.2)] scale: f32,
) {
    let document = rig_document();
    let assembly_options = options(convention, scale);
    let graph = assemble(&document, &assembly_options).unwrap().graph;
    let exported = export_rig(&graph, &document, &ExportOptions::from(&assembly_options)).unwrap();

    for (a, b) in exported.bones.iter().zip(&document.bones) {
        assert!(close(a.position, b.position), "{}: {:?}", b.name, a.position);
        if let (BoneTail::Offset(x), BoneTail::Offset(y)) = (a.tail, b.tail) {
            assert!(close(x, y));
        }
        assert_eq!(a.parent, b.parent);
    }
    let (link, original) = (
        &exported.bones[LEG_IK].ik.as_ref().unwrap().links[0],
        &document.bones[LEG_IK].ik.as_ref().unwrap().links[0],
    );
    assert_eq!(link.limits, original.limits);

    for (a, b) in exported.vertices.iter().zip(&document.vertices) {
        assert!(close(a.position, b.position));
        assert!(close(a.normal, b.normal));
    }
    for (a, b) in exported.rigid_bodies.iter().zip(&document.rigid_bodies) {
        assert!(close(a.position, b.position), "{}", b.name);
        assert!(close(a.size, b.size), "{}", b.name);
        assert!(close(a.rotation, b.rotation), "{}: {:?}", b.name, a.rotation);
    }
    for (a, b) in exported.joints.iter().zip(&document.joints) {
        assert!(close(a.position, b.position));
        assert!(close(a.rotation, b.rotation));
        assert!(close(a.linear_lower, b.linear_lower));
        assert!(close(a.linear_upper, b.linear_upper));
        assert_eq!(a.angular_lower, b.angular_lower);
        assert_eq!(a.angular_upper, b.angular_upper);
        assert_eq!(a.spring_angular, b.spring_angular);
    }
}

#[test]
fn test_edited_rig_is_written_back() {
    let document = rig_document();
    let mut graph = assemble(&document, &AssembleOptions::default())
        .unwrap()
        .graph;
    graph.bones[NECK].head += Vec3::new(0.0, 0.0, 0.2);
    graph.rigid_bodies[3].rotation = Quat::IDENTITY;

    let exported = export_rig(&graph, &document, &ExportOptions::default()).unwrap();
    assert!(close(exported.bones[NECK].position, Vec3::new(0.0, 16.0, 0.0)));
    assert_eq!(exported.rigid_bodies[3].rotation, Vec3::ZERO);

    let bytes = exported.encode_as(ModelFormat::Pmx {
        encoding: mmd_model::TextEncoding::Utf16Le,
    });
    assert!(bytes.is_ok());
}

#[test]
fn test_export_rejects_foreign_rig() {
    let graph = assemble(&rig_document(), &AssembleOptions::default())
        .unwrap()
        .graph;
    let err = export_rig(&graph, &ModelDocument::default(), &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, RigError::DocumentMismatch(_)));
}
