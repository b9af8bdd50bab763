//! Integration tests for the PMX codec

mod common;

use common::sample_document;
use glam::Vec3;
use mmd_model::*;
use pretty_assertions::assert_eq;
use test_case::test_case;

/// Offset of the first global in a PMX header
const GLOBALS_OFFSET: usize = 9;

#[test]
fn test_roundtrip_preserves_counts() {
    let document = sample_document();
    let bytes = document.to_bytes().unwrap();
    let decoded = ModelDocument::from_bytes(&bytes).unwrap();

    assert_eq!(decoded.vertices.len(), document.vertices.len());
    assert_eq!(decoded.faces, document.faces);
    assert_eq!(decoded.materials.len(), document.materials.len());
    assert_eq!(decoded.bones.len(), document.bones.len());
    assert_eq!(decoded.morphs.len(), document.morphs.len());
    assert_eq!(decoded.rigid_bodies.len(), document.rigid_bodies.len());
    assert_eq!(decoded.joints.len(), document.joints.len());
    assert_eq!(decoded.info, document.info);
    assert_eq!(decoded.textures, document.textures);
}

#[test]
fn test_roundtrip_preserves_fields() {
    let document = sample_document();
    let decoded = ModelDocument::from_bytes(&document.to_bytes().unwrap()).unwrap();

    assert_eq!(decoded.vertices, document.vertices);
    assert_eq!(decoded.materials, document.materials);
    assert_eq!(decoded.morphs, document.morphs);
    assert_eq!(decoded.display_frames, document.display_frames);
    assert_eq!(decoded.rigid_bodies, document.rigid_bodies);
    assert_eq!(decoded.joints, document.joints);

    let elbow = &decoded.bones[2];
    assert!(elbow.transform_after_dynamics());
    assert_eq!(elbow.transform_order, 1);
    assert_eq!(elbow.inherit, document.bones[2].inherit);
    assert_eq!(decoded.bones[1].local_axes, document.bones[1].local_axes);
    assert_eq!(decoded.bones[3].ik, document.bones[3].ik);
    assert!(decoded.bones[3].effective_flags().contains(BoneFlags::IK));
}

#[test]
fn test_reencode_is_byte_stable() {
    let first = sample_document().to_bytes().unwrap();
    let decoded = ModelDocument::from_bytes(&first).unwrap();
    let second = decoded.to_bytes().unwrap();
    assert_eq!(first, second);

    let again = ModelDocument::from_bytes(&second).unwrap();
    assert_eq!(again, decoded);
}

#[test_case(TextEncoding::Utf16Le ; "utf16")]
#[test_case(TextEncoding::Utf8 ; "utf8")]
fn test_text_encodings(encoding: TextEncoding) {
    let document = sample_document();
    let bytes = document.encode_as(ModelFormat::Pmx { encoding }).unwrap();
    assert_eq!(bytes[GLOBALS_OFFSET], u8::from(encoding));

    let decoded = ModelDocument::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.format, ModelFormat::Pmx { encoding });
    assert_eq!(decoded.bones[1].name, "左腕");
    assert_eq!(decoded.info.comment, "コメント");
}

#[test]
fn test_index_widths_follow_counts() {
    let mut document = sample_document();
    let template = document.bones[0].clone();
    document.bones.extend((0..300).map(|i| Bone {
        name: format!("bone{i}"),
        parent: Some(0),
        ..template.clone()
    }));
    document.vertices.extend(
        std::iter::repeat_n(document.vertices[0].clone(), 300),
    );

    let bytes = document.to_bytes().unwrap();
    let globals = &bytes[GLOBALS_OFFSET..GLOBALS_OFFSET + 8];
    // Vertex, texture, material, bone, morph, rigid body
    assert_eq!(&globals[2..], &[2, 1, 1, 2, 1, 1]);

    // Dropping back under the limits narrows the widths again
    let small = sample_document().to_bytes().unwrap();
    assert_eq!(&small[GLOBALS_OFFSET + 2..GLOBALS_OFFSET + 8], &[1, 1, 1, 1, 1, 1]);
}

#[test]
fn test_additional_uv_count_recomputed() {
    let mut document = sample_document();
    document.vertices[0].additional_uvs = vec![glam::Vec4::ONE, glam::Vec4::ONE];

    let bytes = document.to_bytes().unwrap();
    assert_eq!(bytes[GLOBALS_OFFSET + 1], 2);

    let decoded = ModelDocument::from_bytes(&bytes).unwrap();
    assert_eq!(decoded.vertices[0].additional_uvs.len(), 2);
    // Vertices without extra channels are padded with zeroes
    assert_eq!(decoded.vertices[1].additional_uvs, vec![glam::Vec4::ZERO; 2]);
}

#[test]
fn test_unsupported_version() {
    let mut bytes = sample_document().to_bytes().unwrap();
    bytes[4..8].copy_from_slice(&2.1f32.to_le_bytes());
    match ModelDocument::from_bytes(&bytes) {
        Err(ModelError::UnsupportedVersion(version)) => assert_eq!(version, "PMX 2.1"),
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn test_invalid_magic() {
    assert!(matches!(
        ModelDocument::from_bytes(b"Vocaloid Motion Data 0002"),
        Err(ModelError::InvalidMagic { .. })
    ));
}

#[test]
fn test_truncated_file() {
    let bytes = sample_document().to_bytes().unwrap();
    let err = ModelDocument::from_bytes(&bytes[..bytes.len() - 1]).unwrap_err();
    assert!(err.is_truncated(), "unexpected error: {err}");
    assert!(err.offset().is_some());

    // No prefix of a valid file decodes
    for cut in (0..bytes.len()).step_by(7) {
        assert!(ModelDocument::from_bytes(&bytes[..cut]).is_err(), "cut at {cut}");
    }
}

#[test]
fn test_cut_inside_text_is_truncated() {
    let mut document = sample_document();
    document.info.name = "abcdefgh".into();
    let bytes = document.to_bytes().unwrap();

    // 17 header bytes, the name length, then 6 of its 16 bytes
    let err = ModelDocument::from_bytes(&bytes[..17 + 4 + 6]).unwrap_err();
    assert!(err.is_truncated(), "unexpected error: {err}");
    match err {
        ModelError::Data(mmd_data::DataError::TruncatedData {
            offset,
            requested,
            available,
        }) => {
            assert_eq!(offset, 21);
            assert_eq!(requested, 16);
            assert_eq!(available, 6);
        }
        other => panic!("expected truncation, got {other:?}"),
    }
}

#[test]
fn test_section_size_mismatch() {
    let mut bytes = ModelDocument::default().to_bytes().unwrap();
    // 17 header bytes and four empty strings precede the vertex count
    let offset = 17 + 16;
    bytes[offset..offset + 4].copy_from_slice(&1000i32.to_le_bytes());

    match ModelDocument::from_bytes(&bytes) {
        Err(ModelError::SectionSizeMismatch {
            section,
            offset: at,
            declared,
            ..
        }) => {
            assert_eq!(section, Section::Vertices);
            assert_eq!(at, offset);
            assert_eq!(declared, 1000);
        }
        other => panic!("expected section size mismatch, got {other:?}"),
    }
}

#[test]
fn test_unknown_joint_kind_rejected() {
    let document = sample_document();
    let bytes = document.to_bytes().unwrap();
    // Joint name "腕_ひじ" (4 UTF-16 units) and an empty English name
    let joint_start = bytes.len() - (4 + 8 + 4 + 1 + 2 + 96);
    let kind_offset = joint_start + 4 + 8 + 4;
    assert_eq!(bytes[kind_offset], 0);

    let mut corrupt = bytes.clone();
    corrupt[kind_offset] = 1;
    assert!(matches!(
        ModelDocument::from_bytes(&corrupt),
        Err(ModelError::InvalidValue { field: "joint kind", value: 1, .. })
    ));
}

#[test]
fn test_load_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.pmx");
    let document = sample_document();
    document.save(&path).unwrap();

    let loaded = ModelDocument::load(&path).unwrap();
    assert_eq!(loaded.bones.len(), 4);
    assert_eq!(loaded.bones[0].position, Vec3::new(0.0, 8.0, 0.0));
}
