//! PMD 1.0 container layout.
//!
//! PMD stores the same logical model with fixed-width Shift_JIS strings,
//! bone-relative rigid body positions and a separate IK list. Decoding
//! folds those back onto the shared [`ModelDocument`] shape.

use std::collections::BTreeMap;

use glam::{Vec3, Vec4};
use mmd_data::{ByteReader, ByteWriter};

use crate::document::ModelDocument;
use crate::error::{ModelError, Result};
use crate::sections::{
    Bone, BoneFlags, BoneTail, DisplayFrame, FrameItem, IkChain, IkLink, InheritLink, Joint,
    Material, MaterialFlags, Morph, MorphOffsets, PhysicsMode, PmdBoneExtra, RigidBody,
    RigidShape, Section, SphereMode, Toon, VertexOffset, check_count, read_enum,
};
use crate::sections::{Skinning, Vertex};
use crate::version::{ModelFormat, PMD_MAGIC, PMD_VERSION};

const NAME_LEN: usize = 20;
const COMMENT_LEN: usize = 256;
const FRAME_NAME_LEN: usize = 50;
const TOON_NAME_LEN: usize = 100;
const TOON_COUNT: usize = 10;

const VERTEX_SIZE: usize = 38;
const MATERIAL_SIZE: usize = 70;
const BONE_SIZE: usize = 39;
const IK_MIN_SIZE: usize = 11;
const SKIN_MIN_SIZE: usize = 25;
const RIGID_BODY_SIZE: usize = 83;
const JOINT_SIZE: usize = 124;

/// `0xFFFF` marks a missing bone reference
const NO_BONE: u16 = 0xFFFF;
const NO_TOON: u8 = 0xFF;

/// Bone kinds of the PMD bone table
mod bone_kind {
    pub const ROTATE: u8 = 0;
    pub const ROTATE_MOVE: u8 = 1;
    pub const IK: u8 = 2;
    pub const IK_TARGET: u8 = 6;
    pub const INVISIBLE: u8 = 7;
    pub const TWIST: u8 = 8;
    pub const ROTATE_INHERIT: u8 = 5;
    pub const ROTATE_FOLLOW: u8 = 9;
}

fn bone_ref(raw: u16) -> Option<u32> {
    (raw != NO_BONE).then_some(raw as u32)
}

fn body_ref(raw: u32) -> Option<u32> {
    (raw != u32::MAX).then_some(raw)
}

fn encode_bone_ref(index: Option<u32>) -> Result<u16> {
    match index {
        None => Ok(NO_BONE),
        Some(i) if i < NO_BONE as u32 => Ok(i as u16),
        Some(i) => Err(ModelError::EncodeError(format!(
            "bone index {i} does not fit a PMD bone reference"
        ))),
    }
}

fn encode_count<T: TryFrom<usize>>(count: usize, what: &str) -> Result<T> {
    T::try_from(count)
        .map_err(|_| ModelError::EncodeError(format!("{count} {what} exceed the PMD limit")))
}

fn read_count(
    reader: &mut ByteReader<'_>,
    section: Section,
    width: usize,
    min_record: usize,
) -> Result<usize> {
    let offset = reader.position();
    let declared = match width {
        1 => reader.read_u8()? as i64,
        2 => reader.read_u16()? as i64,
        _ => reader.read_u32()? as i64,
    };
    let count = check_count(reader, section, offset, declared, min_record)?;
    log::debug!("{section}: {count} element(s) at offset {offset}");
    Ok(count)
}

fn intern(textures: &mut Vec<String>, name: &str) -> u32 {
    match textures.iter().position(|t| t == name) {
        Some(index) => index as u32,
        None => {
            textures.push(name.to_string());
            (textures.len() - 1) as u32
        }
    }
}

/// Split a `texture*sphere` field into texture table references
fn split_texture_field(
    field: &str,
    textures: &mut Vec<String>,
) -> (Option<u32>, Option<u32>, SphereMode) {
    let mut texture = None;
    let mut sphere = None;
    let mut mode = SphereMode::Disabled;
    for part in field.split('*').filter(|p| !p.is_empty()) {
        let lower = part.to_ascii_lowercase();
        let index = intern(textures, part);
        if lower.ends_with(".sph") {
            sphere = Some(index);
            mode = SphereMode::Multiply;
        } else if lower.ends_with(".spa") {
            sphere = Some(index);
            mode = SphereMode::Add;
        } else {
            texture = Some(index);
        }
    }
    (texture, sphere, mode)
}

fn join_texture_field(material: &Material, textures: &[String]) -> String {
    let lookup = |index: Option<u32>| index.and_then(|i| textures.get(i as usize));
    let texture = lookup(material.texture);
    let sphere = match material.sphere_mode {
        SphereMode::Disabled => None,
        _ => lookup(material.sphere_texture),
    };
    match (texture, sphere) {
        (Some(t), Some(s)) => format!("{t}*{s}"),
        (Some(t), None) => t.clone(),
        (None, Some(s)) => s.clone(),
        (None, None) => String::new(),
    }
}

fn default_toon_textures() -> Vec<String> {
    (1..=TOON_COUNT).map(|i| format!("toon{i:02}.bmp")).collect()
}

fn bone_from_pmd(name: String, parent: u16, tail: u16, kind: u8, link: u16, head: Vec3) -> Bone {
    let mut flags = BoneFlags::ROTATABLE | BoneFlags::VISIBLE | BoneFlags::CONTROLLABLE;
    let mut tail_ref = BoneTail::Bone(bone_ref(tail));
    let mut inherit = None;
    match kind {
        bone_kind::ROTATE_MOVE | bone_kind::IK => flags |= BoneFlags::TRANSLATABLE,
        bone_kind::ROTATE_INHERIT => {
            inherit = Some(InheritLink {
                parent: bone_ref(link),
                weight: 1.0,
                rotation: true,
                translation: false,
            });
        }
        bone_kind::IK_TARGET => flags.remove(BoneFlags::VISIBLE),
        bone_kind::INVISIBLE => flags.remove(BoneFlags::VISIBLE | BoneFlags::CONTROLLABLE),
        bone_kind::ROTATE_FOLLOW => {
            // The tail field carries the follow ratio in percent
            inherit = Some(InheritLink {
                parent: bone_ref(link),
                weight: tail as f32 / 100.0,
                rotation: true,
                translation: false,
            });
            tail_ref = BoneTail::Bone(None);
            flags.remove(BoneFlags::VISIBLE);
        }
        _ => {}
    }

    Bone {
        name,
        position: head,
        parent: bone_ref(parent),
        flags,
        tail: tail_ref,
        inherit,
        pmd: Some(PmdBoneExtra {
            kind,
            link: bone_ref(link),
        }),
        ..Default::default()
    }
}

/// PMD kind and link for a bone that did not come from a PMD file
fn derive_pmd_extra(bone: &Bone) -> PmdBoneExtra {
    let flags = bone.effective_flags();
    let kind = if bone.ik.is_some() {
        bone_kind::IK
    } else if bone.inherit.is_some_and(|l| l.rotation) {
        bone_kind::ROTATE_INHERIT
    } else if !bone.is_visible() {
        bone_kind::INVISIBLE
    } else if flags.contains(BoneFlags::FIXED_AXIS) {
        bone_kind::TWIST
    } else if flags.contains(BoneFlags::TRANSLATABLE) {
        bone_kind::ROTATE_MOVE
    } else {
        bone_kind::ROTATE
    };
    let link = bone.inherit.and_then(|l| l.parent).or(Some(0));
    PmdBoneExtra { kind, link }
}

/// Decode a complete PMD file
pub fn decode(data: &[u8]) -> Result<ModelDocument> {
    let mut reader = ByteReader::new(data);
    let magic: [u8; 3] = reader.read_array()?;
    if magic != PMD_MAGIC {
        return Err(ModelError::InvalidMagic {
            expected: String::from_utf8_lossy(&PMD_MAGIC).into(),
            actual: String::from_utf8_lossy(&magic).into(),
        });
    }
    let version = reader.read_f32()?;
    if version != PMD_VERSION {
        return Err(ModelError::UnsupportedVersion(format!("PMD {version:.1}")));
    }

    let mut doc = ModelDocument {
        format: ModelFormat::Pmd,
        ..Default::default()
    };
    doc.info.name = reader.read_fixed_sjis(NAME_LEN)?;
    doc.info.comment = reader.read_fixed_sjis(COMMENT_LEN)?;

    read_geometry(&mut reader, &mut doc)?;
    read_bones(&mut reader, &mut doc)?;
    let has_base_skin = read_skins(&mut reader, &mut doc)?;
    let frame_names = read_display(&mut reader, &mut doc)?;
    read_optional(&mut reader, &mut doc, has_base_skin, frame_names)?;

    if doc.toon_textures.is_empty() {
        doc.toon_textures = default_toon_textures();
    }
    Ok(doc)
}

fn read_geometry(reader: &mut ByteReader<'_>, doc: &mut ModelDocument) -> Result<()> {
    let count = read_count(reader, Section::Vertices, 4, VERTEX_SIZE)?;
    doc.vertices.reserve(count);
    for _ in 0..count {
        let position = reader.read_vec3()?;
        let normal = reader.read_vec3()?;
        let uv = reader.read_vec2()?;
        let bones = [bone_ref(reader.read_u16()?), bone_ref(reader.read_u16()?)];
        let weight = reader.read_u8()? as f32 / 100.0;
        let edge_off = reader.read_u8()?;
        doc.vertices.push(Vertex {
            position,
            normal,
            uv,
            additional_uvs: Vec::new(),
            skinning: Skinning::Bdef2 { bones, weight },
            edge_scale: if edge_off == 0 { 1.0 } else { 0.0 },
        });
    }

    let offset = reader.position();
    let count = read_count(reader, Section::Faces, 4, 2)?;
    if count % 3 != 0 {
        return Err(ModelError::InvalidValue {
            field: "face index count",
            value: count as u32,
            offset,
        });
    }
    doc.faces.reserve(count / 3);
    for _ in 0..count / 3 {
        doc.faces.push([
            reader.read_u16()? as u32,
            reader.read_u16()? as u32,
            reader.read_u16()? as u32,
        ]);
    }

    let count = read_count(reader, Section::Materials, 4, MATERIAL_SIZE)?;
    doc.materials.reserve(count);
    for i in 0..count {
        let diffuse = reader.read_vec3()?;
        let alpha = reader.read_f32()?;
        let specular_power = reader.read_f32()?;
        let specular = reader.read_vec3()?;
        let ambient = reader.read_vec3()?;
        let toon = reader.read_u8()?;
        let edge = reader.read_u8()?;
        let index_count = reader.read_u32()?;
        let field = reader.read_fixed_sjis(NAME_LEN)?;
        let (texture, sphere_texture, sphere_mode) = split_texture_field(&field, &mut doc.textures);

        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::EDGE, edge != 0);
        flags.set(MaterialFlags::DOUBLE_SIDED, alpha < 1.0);
        // Alpha 0.98 is the PMD convention for "no shadow"
        if alpha != 0.98 {
            flags |= MaterialFlags::GROUND_SHADOW
                | MaterialFlags::SELF_SHADOW_MAP
                | MaterialFlags::SELF_SHADOW;
        }

        doc.materials.push(Material {
            name: format!("material{i}"),
            diffuse: diffuse.extend(alpha),
            specular,
            specular_power,
            ambient,
            flags,
            edge_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            edge_size: 1.0,
            texture,
            sphere_texture,
            sphere_mode,
            toon: if toon == NO_TOON {
                Toon::Texture(None)
            } else {
                Toon::Shared(toon)
            },
            index_count,
            ..Default::default()
        });
    }
    Ok(())
}

fn read_bones(reader: &mut ByteReader<'_>, doc: &mut ModelDocument) -> Result<()> {
    let count = read_count(reader, Section::Bones, 2, BONE_SIZE)?;
    doc.bones.reserve(count);
    for _ in 0..count {
        let name = reader.read_fixed_sjis(NAME_LEN)?;
        let parent = reader.read_u16()?;
        let tail = reader.read_u16()?;
        let kind = reader.read_u8()?;
        let link = reader.read_u16()?;
        let head = reader.read_vec3()?;
        doc.bones
            .push(bone_from_pmd(name, parent, tail, kind, link, head));
    }

    // Twist bones turn around the axis towards their tail
    for i in 0..doc.bones.len() {
        let bone = &doc.bones[i];
        if bone.pmd.map(|p| p.kind) != Some(bone_kind::TWIST) {
            continue;
        }
        let BoneTail::Bone(Some(tail)) = bone.tail else {
            continue;
        };
        if let Some(target) = doc.bones.get(tail as usize) {
            let axis = (target.position - bone.position).normalize_or_zero();
            if axis != Vec3::ZERO {
                doc.bones[i].fixed_axis = Some(axis);
            }
        }
    }

    let count = read_count(reader, Section::IkChains, 2, IK_MIN_SIZE)?;
    for _ in 0..count {
        let offset = reader.position();
        let ik_bone = reader.read_u16()?;
        let target = reader.read_u16()?;
        let chain = reader.read_u8()?;
        let iterations = reader.read_u16()?;
        let control_weight = reader.read_f32()?;
        let links = (0..chain)
            .map(|_| -> Result<IkLink> {
                Ok(IkLink {
                    bone: bone_ref(reader.read_u16()?),
                    limits: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let bone = doc
            .bones
            .get_mut(ik_bone as usize)
            .ok_or(ModelError::InvalidValue {
                field: "IK bone",
                value: ik_bone as u32,
                offset,
            })?;
        bone.ik = Some(IkChain {
            target: bone_ref(target),
            loop_count: iterations as i32,
            limit_angle: control_weight * 4.0,
            links,
        });
    }
    Ok(())
}

/// Returns whether a base skin was present
fn read_skins(reader: &mut ByteReader<'_>, doc: &mut ModelDocument) -> Result<bool> {
    let count = read_count(reader, Section::Morphs, 2, SKIN_MIN_SIZE)?;
    let mut base: Vec<u32> = Vec::new();
    let mut has_base = false;
    for _ in 0..count {
        let name = reader.read_fixed_sjis(NAME_LEN)?;
        let entries = read_count(reader, Section::Morphs, 4, 16)?;
        let panel = reader.read_u8()?;

        let mut raw = Vec::with_capacity(entries);
        for _ in 0..entries {
            let offset = reader.position();
            raw.push((offset, reader.read_u32()?, reader.read_vec3()?));
        }

        if panel == 0 {
            base = raw.iter().map(|&(_, vertex, _)| vertex).collect();
            has_base = true;
            continue;
        }

        let offsets = raw
            .into_iter()
            .map(|(offset, index, delta)| -> Result<VertexOffset> {
                let vertex = base.get(index as usize).copied().ok_or(
                    ModelError::InvalidValue {
                        field: "skin vertex",
                        value: index,
                        offset,
                    },
                )?;
                Ok(VertexOffset {
                    vertex,
                    offset: delta,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        doc.morphs.push(Morph {
            name,
            panel,
            offsets: MorphOffsets::Vertex(offsets),
            ..Default::default()
        });
    }
    Ok(has_base)
}

/// Fold the skin and bone display lists into display frames; returns the
/// number of named bone frames
fn read_display(reader: &mut ByteReader<'_>, doc: &mut ModelDocument) -> Result<usize> {
    let skin_count = read_count(reader, Section::DisplayFrames, 1, 2)?;
    let mut face_items = Vec::with_capacity(skin_count);
    for _ in 0..skin_count {
        let skin = reader.read_u16()? as u32;
        face_items.push(FrameItem::Morph(skin.checked_sub(1)));
    }

    let name_count = read_count(reader, Section::DisplayFrames, 1, FRAME_NAME_LEN)?;
    let mut frames: Vec<DisplayFrame> = Vec::with_capacity(name_count + 2);
    frames.push(DisplayFrame {
        name: "Root".into(),
        name_en: "Root".into(),
        special: true,
        items: if doc.bones.is_empty() {
            Vec::new()
        } else {
            vec![FrameItem::Bone(Some(0))]
        },
    });
    frames.push(DisplayFrame {
        name: "表情".into(),
        name_en: "Exp".into(),
        special: true,
        items: face_items,
    });
    for _ in 0..name_count {
        frames.push(DisplayFrame {
            name: reader.read_fixed_sjis(FRAME_NAME_LEN)?,
            ..Default::default()
        });
    }

    let count = read_count(reader, Section::DisplayFrames, 4, 3)?;
    for _ in 0..count {
        let offset = reader.position();
        let bone = bone_ref(reader.read_u16()?);
        let frame = reader.read_u8()? as usize;
        match frames.get_mut(frame + 1).filter(|_| frame > 0) {
            Some(target) => target.items.push(FrameItem::Bone(bone)),
            None => {
                return Err(ModelError::InvalidValue {
                    field: "bone display frame",
                    value: frame as u32,
                    offset,
                });
            }
        }
    }

    doc.display_frames = frames;
    Ok(name_count)
}

/// Sections that older files end before: English names, toon names and physics
fn read_optional(
    reader: &mut ByteReader<'_>,
    doc: &mut ModelDocument,
    has_base_skin: bool,
    frame_names: usize,
) -> Result<()> {
    if reader.is_at_end() {
        return Ok(());
    }
    let has_english = read_enum(reader, "English name flag", |v| (v <= 1).then_some(v == 1))?;
    if has_english {
        doc.info.name_en = reader.read_fixed_sjis(NAME_LEN)?;
        doc.info.comment_en = reader.read_fixed_sjis(COMMENT_LEN)?;
        for bone in &mut doc.bones {
            bone.name_en = reader.read_fixed_sjis(NAME_LEN)?;
        }
        if has_base_skin {
            for morph in &mut doc.morphs {
                morph.name_en = reader.read_fixed_sjis(NAME_LEN)?;
            }
        }
        for frame in doc.display_frames.iter_mut().skip(2).take(frame_names) {
            frame.name_en = reader.read_fixed_sjis(FRAME_NAME_LEN)?;
        }
    }

    if reader.is_at_end() {
        return Ok(());
    }
    doc.toon_textures = (0..TOON_COUNT)
        .map(|_| reader.read_fixed_sjis(TOON_NAME_LEN))
        .collect::<mmd_data::Result<Vec<_>>>()?;

    if reader.is_at_end() {
        return Ok(());
    }
    let count = read_count(reader, Section::RigidBodies, 4, RIGID_BODY_SIZE)?;
    doc.rigid_bodies.reserve(count);
    for _ in 0..count {
        let name = reader.read_fixed_sjis(NAME_LEN)?;
        let bone = bone_ref(reader.read_u16()?);
        let group = read_enum(reader, "collision group", |v| (v < 16).then_some(v))?;
        let non_collision_mask = reader.read_u16()?;
        let shape = read_enum(reader, "rigid body shape", RigidShape::from_u8)?;
        let size = reader.read_vec3()?;
        let relative = reader.read_vec3()?;
        let rotation = reader.read_vec3()?;

        let anchor = bone.unwrap_or(0) as usize;
        let head = doc
            .bones
            .get(anchor)
            .map(|b| b.position)
            .unwrap_or(Vec3::ZERO);

        doc.rigid_bodies.push(RigidBody {
            name,
            name_en: String::new(),
            bone,
            group,
            non_collision_mask,
            shape,
            size,
            position: head + relative,
            rotation,
            mass: reader.read_f32()?,
            linear_damping: reader.read_f32()?,
            angular_damping: reader.read_f32()?,
            restitution: reader.read_f32()?,
            friction: reader.read_f32()?,
            mode: read_enum(reader, "physics mode", PhysicsMode::from_u8)?,
        });
    }

    if reader.is_at_end() {
        return Ok(());
    }
    let count = read_count(reader, Section::Joints, 4, JOINT_SIZE)?;
    doc.joints.reserve(count);
    for _ in 0..count {
        let mut joint = Joint {
            name: reader.read_fixed_sjis(NAME_LEN)?,
            body_a: body_ref(reader.read_u32()?),
            body_b: body_ref(reader.read_u32()?),
            ..Default::default()
        };
        Joint::read_transform(reader, &mut joint)?;
        doc.joints.push(joint);
    }

    if !reader.is_at_end() {
        log::warn!(
            "Ignoring {} trailing byte(s) after the joint section",
            reader.remaining()
        );
    }
    Ok(())
}

/// Two-bone skinning for PMD: bones and the first bone's weight in percent
fn pmd_skinning(skinning: &Skinning) -> (Option<u32>, Option<u32>, u8) {
    let percent = |w: f32| (w * 100.0).round().clamp(0.0, 100.0) as u8;
    match skinning {
        Skinning::Bdef1 { bone } => (*bone, *bone, 100),
        Skinning::Bdef2 { bones, weight } | Skinning::Sdef { bones, weight, .. } => {
            (bones[0], bones[1], percent(*weight))
        }
        Skinning::Bdef4 { .. } => {
            let mut influences = skinning.influences();
            influences.sort_by(|a, b| b.1.total_cmp(&a.1));
            match influences.as_slice() {
                [] => (Some(0), Some(0), 100),
                [(a, _)] => (Some(*a), Some(*a), 100),
                [(a, wa), (b, wb), ..] => (Some(*a), Some(*b), percent(wa / (wa + wb))),
            }
        }
    }
}

/// Encode a document as PMD 1.0
pub fn encode(doc: &ModelDocument) -> Result<Vec<u8>> {
    if doc.vertices.len() > NO_BONE as usize {
        return Err(ModelError::EncodeError(format!(
            "{} vertices exceed the PMD limit of 65535",
            doc.vertices.len()
        )));
    }

    let mut w = ByteWriter::with_capacity(VERTEX_SIZE * doc.vertices.len() + 4096);
    w.write_bytes(&PMD_MAGIC);
    w.write_f32(PMD_VERSION)?;
    w.write_fixed_sjis(&doc.info.name, NAME_LEN)?;
    w.write_fixed_sjis(&doc.info.comment, COMMENT_LEN)?;

    w.write_u32(encode_count(doc.vertices.len(), "vertices")?)?;
    for v in &doc.vertices {
        w.write_vec3(v.position)?;
        w.write_vec3(v.normal)?;
        w.write_vec2(v.uv)?;
        let (a, b, weight) = pmd_skinning(&v.skinning);
        w.write_u16(encode_bone_ref(a)?)?;
        w.write_u16(encode_bone_ref(b)?)?;
        w.write_u8(weight)?;
        w.write_u8((v.edge_scale == 0.0) as u8)?;
    }

    w.write_u32(encode_count(doc.faces.len() * 3, "face indices")?)?;
    for &index in doc.faces.iter().flatten() {
        let index = u16::try_from(index).map_err(|_| {
            ModelError::EncodeError(format!("face index {index} does not fit a PMD face"))
        })?;
        w.write_u16(index)?;
    }

    w.write_u32(encode_count(doc.materials.len(), "materials")?)?;
    for m in &doc.materials {
        w.write_vec3(m.diffuse.truncate())?;
        w.write_f32(m.diffuse.w)?;
        w.write_f32(m.specular_power)?;
        w.write_vec3(m.specular)?;
        w.write_vec3(m.ambient)?;
        w.write_u8(match m.toon {
            Toon::Shared(index) => index,
            Toon::Texture(_) => NO_TOON,
        })?;
        w.write_u8(m.has_edge() as u8)?;
        w.write_u32(m.index_count)?;
        w.write_fixed_sjis(&join_texture_field(m, &doc.textures), NAME_LEN)?;
    }

    w.write_u16(encode_count(doc.bones.len(), "bones")?)?;
    for bone in &doc.bones {
        let extra = bone.pmd.unwrap_or_else(|| derive_pmd_extra(bone));
        let tail = match (extra.kind, bone.inherit, bone.tail) {
            (bone_kind::ROTATE_FOLLOW, Some(link), _) => (link.weight * 100.0).round() as u16,
            (_, _, BoneTail::Bone(target)) => encode_bone_ref(target)?,
            (_, _, BoneTail::Offset(_)) => NO_BONE,
        };
        w.write_fixed_sjis(&bone.name, NAME_LEN)?;
        w.write_u16(encode_bone_ref(bone.parent)?)?;
        w.write_u16(tail)?;
        w.write_u8(extra.kind)?;
        w.write_u16(encode_bone_ref(extra.link)?)?;
        w.write_vec3(bone.position)?;
    }

    let ik_bones: Vec<(usize, &IkChain)> = doc
        .bones
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.ik.as_ref().map(|ik| (i, ik)))
        .collect();
    w.write_u16(encode_count(ik_bones.len(), "IK chains")?)?;
    for (index, ik) in ik_bones {
        w.write_u16(encode_bone_ref(Some(index as u32))?)?;
        w.write_u16(encode_bone_ref(ik.target)?)?;
        w.write_u8(encode_count(ik.links.len(), "IK links")?)?;
        w.write_u16(ik.loop_count.clamp(0, u16::MAX as i32) as u16)?;
        w.write_f32(ik.limit_angle / 4.0)?;
        for link in &ik.links {
            w.write_u16(encode_bone_ref(link.bone)?)?;
        }
    }

    let skin_index = write_skins(&mut w, doc)?;
    write_display(&mut w, doc, &skin_index)?;

    // English names
    w.write_u8(1)?;
    w.write_fixed_sjis(&doc.info.name_en, NAME_LEN)?;
    w.write_fixed_sjis(&doc.info.comment_en, COMMENT_LEN)?;
    for bone in &doc.bones {
        w.write_fixed_sjis(&bone.name_en, NAME_LEN)?;
    }
    for (morph, _) in doc.morphs.iter().zip(&skin_index).filter(|(_, s)| s.is_some()) {
        w.write_fixed_sjis(&morph.name_en, NAME_LEN)?;
    }
    for frame in doc.display_frames.iter().filter(|f| !f.special) {
        w.write_fixed_sjis(&frame.name_en, FRAME_NAME_LEN)?;
    }

    let defaults = default_toon_textures();
    for i in 0..TOON_COUNT {
        let name = doc.toon_textures.get(i).unwrap_or(&defaults[i]);
        w.write_fixed_sjis(name, TOON_NAME_LEN)?;
    }

    w.write_u32(encode_count(doc.rigid_bodies.len(), "rigid bodies")?)?;
    for body in &doc.rigid_bodies {
        let anchor = body.bone.unwrap_or(0) as usize;
        let head = doc
            .bones
            .get(anchor)
            .map(|b| b.position)
            .unwrap_or(Vec3::ZERO);
        let relative = RigidBody {
            position: body.position - head,
            ..body.clone()
        };
        w.write_fixed_sjis(&body.name, NAME_LEN)?;
        w.write_u16(encode_bone_ref(body.bone)?)?;
        relative.write_physics(&mut w)?;
    }

    w.write_u32(encode_count(doc.joints.len(), "joints")?)?;
    for joint in &doc.joints {
        w.write_fixed_sjis(&joint.name, NAME_LEN)?;
        w.write_u32(joint.body_a.unwrap_or(u32::MAX))?;
        w.write_u32(joint.body_b.unwrap_or(u32::MAX))?;
        joint.write_transform(&mut w)?;
    }

    log::debug!("Encoded PMD with {} byte(s)", w.len());
    Ok(w.into_inner())
}

/// Write the base skin plus one skin per vertex morph; returns the PMD skin
/// index of each morph (`None` for morph kinds PMD cannot hold)
fn write_skins(w: &mut ByteWriter, doc: &ModelDocument) -> Result<Vec<Option<u16>>> {
    let mut base: BTreeMap<u32, u32> = BTreeMap::new();
    for morph in &doc.morphs {
        if let MorphOffsets::Vertex(offsets) = &morph.offsets {
            for o in offsets {
                base.entry(o.vertex).or_insert(0);
            }
        }
    }
    for (slot, index) in base.values_mut().zip(0u32..) {
        *slot = index;
    }

    let mut skin_index = Vec::with_capacity(doc.morphs.len());
    let mut next: u16 = 1;
    for morph in &doc.morphs {
        if matches!(morph.offsets, MorphOffsets::Vertex(_)) {
            skin_index.push(Some(next));
            next = next.checked_add(1).ok_or_else(|| {
                ModelError::EncodeError("too many morphs for PMD".to_string())
            })?;
        } else {
            log::warn!(
                "Morph '{}' ({:?}) has no PMD representation and is skipped",
                morph.name,
                morph.kind()
            );
            skin_index.push(None);
        }
    }

    let skins = (next - 1) as usize;
    if skins == 0 {
        w.write_u16(0)?;
        return Ok(skin_index);
    }

    w.write_u16(encode_count(skins + 1, "skins")?)?;
    w.write_fixed_sjis("base", NAME_LEN)?;
    w.write_u32(encode_count(base.len(), "base skin vertices")?)?;
    w.write_u8(0)?;
    for &vertex in base.keys() {
        let position = doc
            .vertices
            .get(vertex as usize)
            .map(|v| v.position)
            .ok_or_else(|| {
                ModelError::EncodeError(format!("morph references missing vertex {vertex}"))
            })?;
        w.write_u32(vertex)?;
        w.write_vec3(position)?;
    }

    for morph in &doc.morphs {
        let MorphOffsets::Vertex(offsets) = &morph.offsets else {
            continue;
        };
        w.write_fixed_sjis(&morph.name, NAME_LEN)?;
        w.write_u32(encode_count(offsets.len(), "skin vertices")?)?;
        w.write_u8(morph.panel.clamp(1, 4))?;
        for o in offsets {
            w.write_u32(base[&o.vertex])?;
            w.write_vec3(o.offset)?;
        }
    }
    Ok(skin_index)
}

fn write_display(w: &mut ByteWriter, doc: &ModelDocument, skin_index: &[Option<u16>]) -> Result<()> {
    let face_items: Vec<u16> = doc
        .display_frames
        .iter()
        .flat_map(|f| &f.items)
        .filter_map(|item| match *item {
            FrameItem::Morph(Some(m)) => skin_index.get(m as usize).copied().flatten(),
            _ => None,
        })
        .collect();
    w.write_u8(encode_count(face_items.len(), "displayed morphs")?)?;
    for skin in face_items {
        w.write_u16(skin)?;
    }

    let named: Vec<&DisplayFrame> = doc.display_frames.iter().filter(|f| !f.special).collect();
    w.write_u8(encode_count(named.len(), "display frames")?)?;
    for frame in &named {
        w.write_fixed_sjis(&frame.name, FRAME_NAME_LEN)?;
    }

    let mut items: Vec<(u16, u8)> = Vec::new();
    for (frame, number) in named.iter().zip(1..=u8::MAX) {
        for item in &frame.items {
            if let FrameItem::Bone(Some(b)) = *item {
                items.push((encode_bone_ref(Some(b))?, number));
            }
        }
    }
    w.write_u32(encode_count(items.len(), "displayed bones")?)?;
    for (bone, frame) in items {
        w.write_u16(bone)?;
        w.write_u8(frame)?;
    }
    Ok(())
}
