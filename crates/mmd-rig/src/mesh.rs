use mmd_model::{ModelDocument, MorphOffsets};

use crate::convention::HostConvention;
use crate::error::{Entity, Warnings};
use crate::graph::{MaterialRange, MeshMorph, RigMesh};

/// Convert vertices, faces and vertex morphs into host space
pub(crate) fn build_mesh(
    document: &ModelDocument,
    host: HostConvention,
    scale: f32,
    warnings: &mut Warnings,
) -> RigMesh {
    let bone_count = document.bones.len();
    let vertex_count = document.vertices.len();
    let mirror = host.is_mirroring();

    let mut mesh = RigMesh {
        positions: Vec::with_capacity(vertex_count),
        normals: Vec::with_capacity(vertex_count),
        uvs: Vec::with_capacity(vertex_count),
        weights: Vec::with_capacity(vertex_count),
        ..Default::default()
    };

    for (index, vertex) in document.vertices.iter().enumerate() {
        mesh.positions.push(host.convert_vec(vertex.position * scale));
        mesh.normals.push(host.convert_vec(vertex.normal));
        mesh.uvs.push(vertex.uv);

        let mut influences: Vec<(usize, f32)> = Vec::with_capacity(4);
        for (bone, weight) in vertex.skinning.influences() {
            if (bone as usize) < bone_count {
                influences.push((bone as usize, weight));
            } else {
                warnings.dangling(Entity::Vertex, index, "bone", bone);
            }
        }
        let total: f32 = influences.iter().map(|(_, w)| w).sum();
        if total > 0.0 {
            influences.iter_mut().for_each(|(_, w)| *w /= total);
        }
        mesh.weights.push(influences);
    }

    let kept_face = |index: usize, face: &[u32; 3], warnings: &mut Warnings| -> Option<[u32; 3]> {
        if let Some(&bad) = face.iter().find(|&&v| v as usize >= vertex_count) {
            warnings.dangling(Entity::Face, index, "vertex", bad);
            return None;
        }
        Some(if mirror {
            [face[0], face[2], face[1]]
        } else {
            *face
        })
    };

    let mut next = 0;
    for (index, material) in document.materials.iter().enumerate() {
        let count = (material.index_count / 3) as usize;
        let end = (next + count).min(document.faces.len());
        let first_face = mesh.faces.len();
        for face_index in next..end {
            if let Some(face) = kept_face(face_index, &document.faces[face_index], warnings) {
                mesh.faces.push(face);
            }
        }
        next = end;

        let texture = match material.texture {
            Some(t) => match document.textures.get(t as usize) {
                Some(path) => Some(path.clone()),
                None => {
                    warnings.dangling(Entity::Material, index, "texture", t);
                    None
                }
            },
            None => None,
        };
        mesh.materials.push(MaterialRange {
            name: material.name.clone(),
            first_face,
            face_count: mesh.faces.len() - first_face,
            double_sided: material.is_double_sided(),
            texture,
        });
    }
    for face_index in next..document.faces.len() {
        if let Some(face) = kept_face(face_index, &document.faces[face_index], warnings) {
            mesh.faces.push(face);
        }
    }

    for (index, morph) in document.morphs.iter().enumerate() {
        let MorphOffsets::Vertex(offsets) = &morph.offsets else {
            continue;
        };
        let mut converted = Vec::with_capacity(offsets.len());
        for offset in offsets {
            if offset.vertex as usize >= vertex_count {
                warnings.dangling(Entity::Morph, index, "vertex", offset.vertex);
                continue;
            }
            converted.push((offset.vertex, host.convert_vec(offset.offset * scale)));
        }
        mesh.morphs.push(MeshMorph {
            name: morph.name.clone(),
            offsets: converted,
        });
    }

    log::debug!(
        "Mesh: {} vertices, {} faces, {} material range(s), {} vertex morph(s)",
        mesh.positions.len(),
        mesh.faces.len(),
        mesh.materials.len(),
        mesh.morphs.len()
    );
    mesh
}
