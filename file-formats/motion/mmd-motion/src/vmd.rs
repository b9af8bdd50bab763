//! VMD container layout

use mmd_data::{ByteReader, ByteWriter};

use crate::channel::ChannelKind;
use crate::document::MotionDocument;
use crate::error::{MotionError, Result};
use crate::keys::{
    BONE_INTERPOLATION_LEN, BoneInterpolation, BoneKey, CAMERA_INTERPOLATION_LEN,
    CameraInterpolation, CameraKey, IkState, LightKey, MorphKey, PropertyKey, ShadowKey,
};
use crate::version::{MotionVersion, SIGNATURE_LEN};

const KEY_NAME_LEN: usize = 15;
const IK_NAME_LEN: usize = 20;

const BONE_KEY_SIZE: usize = 111;
const MORPH_KEY_SIZE: usize = 23;
const CAMERA_KEY_SIZE: usize = 61;
const LIGHT_KEY_SIZE: usize = 28;
const SHADOW_KEY_SIZE: usize = 9;
const PROPERTY_KEY_MIN_SIZE: usize = 9;

fn read_count(reader: &mut ByteReader<'_>, kind: ChannelKind, min_record: usize) -> Result<usize> {
    let offset = reader.position();
    let declared = reader.read_u32()?;
    let count = declared as usize;
    if count.saturating_mul(min_record) > reader.remaining() {
        return Err(MotionError::SectionSizeMismatch {
            kind,
            offset,
            declared,
            available: reader.remaining(),
        });
    }
    log::debug!("{kind} keys: {count} at offset {offset}");
    Ok(count)
}

fn write_count(writer: &mut ByteWriter, count: usize, kind: ChannelKind) -> Result<()> {
    let count = u32::try_from(count)
        .map_err(|_| MotionError::EncodeError(format!("too many {kind} keys: {count}")))?;
    writer.write_u32(count)?;
    Ok(())
}

/// Decode a complete VMD file
pub fn decode(data: &[u8]) -> Result<MotionDocument> {
    let mut reader = ByteReader::new(data);
    let signature = reader.take(SIGNATURE_LEN)?;
    let version = MotionVersion::from_signature(signature)?;
    let model_name = reader.read_fixed_sjis(version.model_name_len())?;
    log::debug!("{version} motion for '{model_name}'");

    let mut doc = MotionDocument {
        version,
        model_name,
        ..Default::default()
    };

    let count = read_count(&mut reader, ChannelKind::Bone, BONE_KEY_SIZE)?;
    for _ in 0..count {
        let name = reader.read_fixed_sjis(KEY_NAME_LEN)?;
        let key = BoneKey {
            frame: reader.read_u32()?,
            position: reader.read_vec3()?,
            rotation: reader.read_quat()?,
            interpolation: BoneInterpolation::from_bytes(reader.read_array::<BONE_INTERPOLATION_LEN>()?),
        };
        if doc.bones.insert(&name, key).is_some() {
            log::trace!("Bone '{name}' keyed twice on frame {}", key.frame);
        }
    }

    // Every section after the bone keys may be missing in older files
    if reader.is_at_end() {
        return Ok(doc);
    }
    let count = read_count(&mut reader, ChannelKind::Morph, MORPH_KEY_SIZE)?;
    for _ in 0..count {
        let name = reader.read_fixed_sjis(KEY_NAME_LEN)?;
        let key = MorphKey {
            frame: reader.read_u32()?,
            weight: reader.read_f32()?,
        };
        doc.morphs.insert(&name, key);
    }

    if reader.is_at_end() {
        return Ok(doc);
    }
    let count = read_count(&mut reader, ChannelKind::Camera, CAMERA_KEY_SIZE)?;
    for _ in 0..count {
        doc.camera.insert(CameraKey {
            frame: reader.read_u32()?,
            distance: reader.read_f32()?,
            target: reader.read_vec3()?,
            rotation: reader.read_vec3()?,
            interpolation: CameraInterpolation::from_bytes(
                reader.read_array::<CAMERA_INTERPOLATION_LEN>()?,
            ),
            fov: reader.read_u32()?,
            // Stored inverted: 0 means perspective on
            perspective: reader.read_u8()? == 0,
        });
    }

    if reader.is_at_end() {
        return Ok(doc);
    }
    let count = read_count(&mut reader, ChannelKind::Light, LIGHT_KEY_SIZE)?;
    for _ in 0..count {
        doc.lights.insert(LightKey {
            frame: reader.read_u32()?,
            color: reader.read_vec3()?,
            direction: reader.read_vec3()?,
        });
    }

    if reader.is_at_end() {
        return Ok(doc);
    }
    let count = read_count(&mut reader, ChannelKind::Shadow, SHADOW_KEY_SIZE)?;
    for _ in 0..count {
        doc.shadows.insert(ShadowKey {
            frame: reader.read_u32()?,
            mode: reader.read_u8()?,
            distance: reader.read_f32()?,
        });
    }

    if reader.is_at_end() {
        return Ok(doc);
    }
    let count = read_count(&mut reader, ChannelKind::Visibility, PROPERTY_KEY_MIN_SIZE)?;
    for _ in 0..count {
        let frame = reader.read_u32()?;
        let visible = reader.read_u8()? != 0;
        let states = read_count(&mut reader, ChannelKind::Ik, IK_NAME_LEN + 1)?;
        let ik_states = (0..states)
            .map(|_| -> Result<IkState> {
                Ok(IkState {
                    name: reader.read_fixed_sjis(IK_NAME_LEN)?,
                    enabled: reader.read_u8()? != 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        doc.properties.insert(PropertyKey {
            frame,
            visible,
            ik_states,
        });
    }

    if !reader.is_at_end() {
        return Err(MotionError::UnknownChannelKind {
            tag: None,
            offset: Some(reader.position()),
        });
    }
    Ok(doc)
}

/// Encode a document as a current-revision VMD file.
///
/// Keys are grouped per channel in first-seen channel order with frames
/// ascending.
pub fn encode(doc: &MotionDocument) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(BONE_KEY_SIZE * doc.bones.key_count() + 256);
    let version = MotionVersion::V2;

    let mut signature = [0u8; SIGNATURE_LEN];
    signature[..version.signature().len()].copy_from_slice(version.signature());
    w.write_bytes(&signature);
    w.write_fixed_sjis(&doc.model_name, version.model_name_len())?;

    write_count(&mut w, doc.bones.key_count(), ChannelKind::Bone)?;
    for (name, track) in doc.bones.iter() {
        for key in track {
            w.write_fixed_sjis(name, KEY_NAME_LEN)?;
            w.write_u32(key.frame)?;
            w.write_vec3(key.position)?;
            w.write_quat(key.rotation)?;
            w.write_bytes(&key.interpolation.to_bytes());
        }
    }

    write_count(&mut w, doc.morphs.key_count(), ChannelKind::Morph)?;
    for (name, track) in doc.morphs.iter() {
        for key in track {
            w.write_fixed_sjis(name, KEY_NAME_LEN)?;
            w.write_u32(key.frame)?;
            w.write_f32(key.weight)?;
        }
    }

    write_count(&mut w, doc.camera.len(), ChannelKind::Camera)?;
    for key in &doc.camera {
        w.write_u32(key.frame)?;
        w.write_f32(key.distance)?;
        w.write_vec3(key.target)?;
        w.write_vec3(key.rotation)?;
        w.write_bytes(&key.interpolation.to_bytes());
        w.write_u32(key.fov)?;
        w.write_u8(u8::from(!key.perspective))?;
    }

    write_count(&mut w, doc.lights.len(), ChannelKind::Light)?;
    for key in &doc.lights {
        w.write_u32(key.frame)?;
        w.write_vec3(key.color)?;
        w.write_vec3(key.direction)?;
    }

    write_count(&mut w, doc.shadows.len(), ChannelKind::Shadow)?;
    for key in &doc.shadows {
        w.write_u32(key.frame)?;
        w.write_u8(key.mode)?;
        w.write_f32(key.distance)?;
    }

    write_count(&mut w, doc.properties.len(), ChannelKind::Visibility)?;
    for key in &doc.properties {
        w.write_u32(key.frame)?;
        w.write_u8(u8::from(key.visible))?;
        write_count(&mut w, key.ik_states.len(), ChannelKind::Ik)?;
        for state in &key.ik_states {
            w.write_fixed_sjis(&state.name, IK_NAME_LEN)?;
            w.write_u8(u8::from(state.enabled))?;
        }
    }

    log::debug!("Encoded VMD with {} byte(s)", w.len());
    Ok(w.into_inner())
}
