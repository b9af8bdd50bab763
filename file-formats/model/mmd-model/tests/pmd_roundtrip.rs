//! Integration tests for the PMD codec

mod common;

use common::sample_document;
use glam::Vec3;
use mmd_model::*;
use pretty_assertions::assert_eq;

fn as_pmd(document: &ModelDocument) -> ModelDocument {
    let bytes = document.encode_as(ModelFormat::Pmd).unwrap();
    ModelDocument::from_bytes(&bytes).unwrap()
}

#[test]
fn test_pmd_roundtrip_counts() {
    let document = sample_document();
    let decoded = as_pmd(&document);

    assert_eq!(decoded.format, ModelFormat::Pmd);
    assert_eq!(decoded.vertices.len(), 4);
    assert_eq!(decoded.faces, document.faces);
    assert_eq!(decoded.materials.len(), 1);
    assert_eq!(decoded.bones.len(), 4);
    assert_eq!(decoded.rigid_bodies.len(), 2);
    assert_eq!(decoded.joints.len(), 1);
    // Bone morphs have no PMD representation
    assert_eq!(decoded.morphs.len(), 1);
    assert_eq!(decoded.morphs[0].offsets, document.morphs[0].offsets);
    assert_eq!(decoded.toon_textures.len(), 10);
    assert_eq!(decoded.toon_textures[0], "toon01.bmp");
}

#[test]
fn test_pmd_fields() {
    let document = sample_document();
    let decoded = as_pmd(&document);

    assert_eq!(decoded.info.name, "テスト");
    assert_eq!(decoded.info.name_en, "test");
    assert_eq!(decoded.bones[1].name, "左腕");
    assert_eq!(decoded.bones[1].name_en, "arm_L");
    assert_eq!(decoded.vertices, document.vertices);
    assert_eq!(decoded.display_frames, document.display_frames);
    assert_eq!(decoded.joints, document.joints);

    let material = &decoded.materials[0];
    assert_eq!(material.flags, document.materials[0].flags);
    assert_eq!(material.toon, Toon::Shared(2));
    assert_eq!(material.sphere_mode, SphereMode::Multiply);
    assert_eq!(decoded.textures, document.textures);

    let ik = decoded.bones[3].ik.as_ref().unwrap();
    assert_eq!(ik.target, Some(2));
    assert_eq!(ik.loop_count, 40);
    assert!((ik.limit_angle - 0.5).abs() < 1e-6);
    assert_eq!(decoded.bones[3].pmd.map(|p| p.kind), Some(2));
}

#[test]
fn test_rigid_bodies_are_bone_relative_on_disk() {
    let document = sample_document();
    let decoded = as_pmd(&document);
    for (a, b) in decoded.rigid_bodies.iter().zip(&document.rigid_bodies) {
        assert!((a.position - b.position).length() < 1e-5);
        assert_eq!(a.bone, b.bone);
        assert_eq!(a.non_collision_mask, b.non_collision_mask);
    }
}

#[test]
fn test_unbound_body_is_relative_to_first_bone() {
    let mut document = sample_document();
    document.rigid_bodies[0].bone = None;
    let decoded = as_pmd(&document);
    assert_eq!(decoded.rigid_bodies[0].bone, None);
    assert!((decoded.rigid_bodies[0].position - Vec3::new(2.0, 15.0, 0.0)).length() < 1e-5);
}

#[test]
fn test_pmd_reencode_is_stable() {
    let document = sample_document();
    let first = document.encode_as(ModelFormat::Pmd).unwrap();
    let decoded = ModelDocument::from_bytes(&first).unwrap();
    let second = decoded.to_bytes().unwrap();
    assert_eq!(first, second);
    assert_eq!(ModelDocument::from_bytes(&second).unwrap(), decoded);
}

#[test]
fn test_optional_sections_may_be_absent() {
    let mut document = sample_document();
    document.rigid_bodies.clear();
    document.joints.clear();
    let bytes = document.encode_as(ModelFormat::Pmd).unwrap();

    // English block, toon names and two empty physics counts
    let english = 1 + 20 + 256 + 20 * 4 + 20 + 50;
    let tail = english + 10 * 100 + 4 + 4;
    let legacy = &bytes[..bytes.len() - tail];

    let decoded = ModelDocument::from_bytes(legacy).unwrap();
    assert_eq!(decoded.bones.len(), 4);
    assert_eq!(decoded.info.name_en, "");
    assert_eq!(decoded.toon_textures[9], "toon10.bmp");
    assert!(decoded.rigid_bodies.is_empty());
}

#[test]
fn test_pmd_unsupported_version() {
    let mut bytes = sample_document().encode_as(ModelFormat::Pmd).unwrap();
    bytes[3..7].copy_from_slice(&2.0f32.to_le_bytes());
    assert!(matches!(
        ModelDocument::from_bytes(&bytes),
        Err(ModelError::UnsupportedVersion(v)) if v == "PMD 2.0"
    ));
}

#[test]
fn test_pmd_vertex_limit() {
    let mut document = ModelDocument::default();
    document.vertices = vec![Vertex::default(); 70_000];
    assert!(matches!(
        document.encode_as(ModelFormat::Pmd),
        Err(ModelError::EncodeError(_))
    ));
}

#[test]
fn test_pmd_full_display_frame_table() {
    let mut document = sample_document();
    document.display_frames.retain(|frame| frame.special);
    for i in 0..255 {
        document.display_frames.push(DisplayFrame {
            name: format!("枠{i}"),
            items: vec![FrameItem::Bone(Some(if i == 254 { 2 } else { 1 }))],
            ..Default::default()
        });
    }

    let bytes = document.encode_as(ModelFormat::Pmd).unwrap();
    let decoded = ModelDocument::from_bytes(&bytes).unwrap();
    let named: Vec<&DisplayFrame> = decoded
        .display_frames
        .iter()
        .filter(|frame| !frame.special)
        .collect();
    assert_eq!(named.len(), 255);
    assert_eq!(named[254].name, "枠254");
    assert_eq!(named[254].items, vec![FrameItem::Bone(Some(2))]);

    document.display_frames.push(DisplayFrame {
        name: "枠255".into(),
        ..Default::default()
    });
    assert!(matches!(
        document.encode_as(ModelFormat::Pmd),
        Err(ModelError::EncodeError(_))
    ));
}

#[test]
fn test_pmd_rejects_wide_indices() {
    let mut document = sample_document();
    document.faces.push([0, 1, 70_000]);
    assert!(matches!(
        document.encode_as(ModelFormat::Pmd),
        Err(ModelError::EncodeError(_))
    ));

    let mut document = sample_document();
    document.display_frames.push(DisplayFrame {
        name: "足".into(),
        items: vec![FrameItem::Bone(Some(70_000))],
        ..Default::default()
    });
    assert!(matches!(
        document.encode_as(ModelFormat::Pmd),
        Err(ModelError::EncodeError(_))
    ));
}

#[test]
fn test_pmx_to_pmd_to_pmx() {
    let document = sample_document();
    let pmd = as_pmd(&document);
    let pmx_bytes = pmd
        .encode_as(ModelFormat::Pmx {
            encoding: TextEncoding::Utf8,
        })
        .unwrap();
    let pmx = ModelDocument::from_bytes(&pmx_bytes).unwrap();
    assert_eq!(pmx.bones.len(), pmd.bones.len());
    assert_eq!(pmx.bones[2].name, "左ひじ");
    // The folded IK list becomes a PMX IK block
    assert_eq!(pmx.bones[3].ik.as_ref().map(|ik| ik.target), Some(Some(2)));
}
