//! PMX 2.0 container layout

use mmd_data::{ByteReader, ByteWriter, TextEncoding};

use crate::document::ModelDocument;
use crate::error::{ModelError, Result};
use crate::header::{ModelInfo, PmxGlobals};
use crate::sections::{
    Bone, DisplayFrame, Joint, Material, Morph, RigidBody, Section, Vertex, check_count,
    read_pmx_count, write_pmx_count,
};
use crate::version::ModelFormat;

fn read_section<'a, T>(
    reader: &mut ByteReader<'a>,
    section: Section,
    min_record: usize,
    mut read: impl FnMut(&mut ByteReader<'a>) -> Result<T>,
) -> Result<Vec<T>> {
    let count = read_pmx_count(reader, section, min_record)?;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        items.push(read(reader)?);
    }
    Ok(items)
}

fn write_section<T>(
    writer: &mut ByteWriter,
    items: &[T],
    mut write: impl FnMut(&T, &mut ByteWriter) -> Result<()>,
) -> Result<()> {
    write_pmx_count(writer, items.len())?;
    for item in items {
        write(item, writer)?;
    }
    Ok(())
}

/// Decode a complete PMX file
pub fn decode(data: &[u8]) -> Result<ModelDocument> {
    let mut reader = ByteReader::new(data);
    let globals = PmxGlobals::read(&mut reader)?;
    let encoding = globals.encoding;
    log::debug!("PMX 2.0 globals: {globals:?}");

    let info = ModelInfo::read_pmx(&mut reader, encoding)?;

    let vertices = read_section(
        &mut reader,
        Section::Vertices,
        Vertex::min_pmx_size(&globals),
        |r| Vertex::read_pmx(r, &globals),
    )?;

    let offset = reader.position();
    let declared = reader.read_i32()?;
    let index_count = check_count(
        &reader,
        Section::Faces,
        offset,
        declared as i64,
        globals.vertex_index.bytes(),
    )?;
    if index_count % 3 != 0 {
        return Err(ModelError::InvalidValue {
            field: "face index count",
            value: declared as u32,
            offset,
        });
    }
    let mut faces = Vec::with_capacity(index_count / 3);
    for _ in 0..index_count / 3 {
        faces.push([
            reader.read_vertex_index(globals.vertex_index)?,
            reader.read_vertex_index(globals.vertex_index)?,
            reader.read_vertex_index(globals.vertex_index)?,
        ]);
    }
    log::debug!("faces: {} triangle(s)", faces.len());

    let textures = read_section(&mut reader, Section::Textures, 4, |r| {
        Ok(r.read_text(encoding)?)
    })?;
    let materials = read_section(
        &mut reader,
        Section::Materials,
        Material::min_pmx_size(&globals),
        |r| Material::read_pmx(r, &globals),
    )?;
    let bones = read_section(
        &mut reader,
        Section::Bones,
        Bone::min_pmx_size(&globals),
        |r| Bone::read_pmx(r, &globals),
    )?;
    let morphs = read_section(&mut reader, Section::Morphs, Morph::min_pmx_size(), |r| {
        Morph::read_pmx(r, &globals)
    })?;
    let display_frames = read_section(
        &mut reader,
        Section::DisplayFrames,
        DisplayFrame::min_pmx_size(),
        |r| DisplayFrame::read_pmx(r, &globals),
    )?;
    let rigid_bodies = read_section(
        &mut reader,
        Section::RigidBodies,
        RigidBody::min_pmx_size(&globals),
        |r| RigidBody::read_pmx(r, &globals),
    )?;
    let joints = read_section(
        &mut reader,
        Section::Joints,
        Joint::min_pmx_size(&globals),
        |r| Joint::read_pmx(r, &globals),
    )?;

    if !reader.is_at_end() {
        log::warn!(
            "Ignoring {} trailing byte(s) after the joint section",
            reader.remaining()
        );
    }

    Ok(ModelDocument {
        format: ModelFormat::Pmx { encoding },
        info,
        vertices,
        faces,
        textures,
        materials,
        bones,
        morphs,
        display_frames,
        rigid_bodies,
        joints,
        toon_textures: Vec::new(),
    })
}

/// Encode a document as PMX 2.0.
///
/// Index widths and the additional UV count are derived from the document.
pub fn encode(document: &ModelDocument, encoding: TextEncoding) -> Result<Vec<u8>> {
    let globals = PmxGlobals::for_document(document, encoding)?;
    let mut writer = ByteWriter::with_capacity(64 * document.vertices.len() + 1024);

    globals.write(&mut writer)?;
    document.info.write_pmx(&mut writer, encoding)?;

    write_section(&mut writer, &document.vertices, |v, w| v.write_pmx(w, &globals))?;

    write_pmx_count(&mut writer, document.faces.len() * 3)?;
    for face in &document.faces {
        for &index in face {
            writer.write_vertex_index(index, globals.vertex_index)?;
        }
    }

    write_section(&mut writer, &document.textures, |t, w| {
        Ok(w.write_text(t, encoding)?)
    })?;
    write_section(&mut writer, &document.materials, |m, w| m.write_pmx(w, &globals))?;
    write_section(&mut writer, &document.bones, |b, w| b.write_pmx(w, &globals))?;
    write_section(&mut writer, &document.morphs, |m, w| m.write_pmx(w, &globals))?;
    write_section(&mut writer, &document.display_frames, |f, w| {
        f.write_pmx(w, &globals)
    })?;
    write_section(&mut writer, &document.rigid_bodies, |r, w| {
        r.write_pmx(w, &globals)
    })?;
    write_section(&mut writer, &document.joints, |j, w| j.write_pmx(w, &globals))?;

    log::debug!("Encoded PMX with {} byte(s)", writer.len());
    Ok(writer.into_inner())
}
