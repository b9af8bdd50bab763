//! Rig graph back into a model document

use mmd_model::{BoneTail, ModelDocument, RigidShape};

use crate::error::{Result, RigError};
use crate::graph::RigGraph;
use crate::options::ExportOptions;

/// Write rest pose, mesh and physics data of a (possibly edited) rig back
/// into a copy of the document it was assembled from.
///
/// Every length is converted back to file space and divided by
/// `options.scale`; fields the rig does not carry are kept from `document`.
pub fn export_rig(
    graph: &RigGraph,
    document: &ModelDocument,
    options: &ExportOptions,
) -> Result<ModelDocument> {
    options.validate()?;
    if graph.bones.len() != document.bones.len() {
        return Err(RigError::DocumentMismatch(format!(
            "rig has {} bone(s), model has {}",
            graph.bones.len(),
            document.bones.len()
        )));
    }

    let host = options.convention;
    let unscale = options.scale.recip();
    let mut out = document.clone();

    for (bone, rig) in out.bones.iter_mut().zip(&graph.bones) {
        bone.position = host.convert_vec(rig.head) * unscale;
        if let BoneTail::Offset(_) = bone.tail {
            bone.tail = BoneTail::Offset(host.convert_vec(rig.tail - rig.head) * unscale);
        }
        if let (Some(axes), Some((x, z))) = (bone.local_axes.as_mut(), rig.local_axes) {
            axes.x = host.convert_vec(x);
            axes.z = host.convert_vec(z);
        }
        if let Some(axis) = rig.fixed_axis {
            bone.fixed_axis = Some(host.convert_vec(axis));
        }
        if let (Some(chain), Some(rig_ik)) = (bone.ik.as_mut(), &rig.ik) {
            for link in &mut chain.links {
                let rig_link = rig_ik
                    .links
                    .iter()
                    .find(|l| link.bone == Some(l.bone as u32));
                if let Some((lower, upper)) = rig_link.and_then(|l| l.limits) {
                    link.limits = Some(host.convert_angular_range(lower, upper));
                }
            }
        }
    }

    let mesh = &graph.mesh;
    if mesh.positions.len() == out.vertices.len() {
        for (vertex, (position, normal)) in out
            .vertices
            .iter_mut()
            .zip(mesh.positions.iter().zip(&mesh.normals))
        {
            vertex.position = host.convert_vec(*position) * unscale;
            vertex.normal = host.convert_vec(*normal);
        }
    } else {
        log::warn!(
            "Keeping model vertices: rig mesh has {} vertices, model has {}",
            mesh.positions.len(),
            out.vertices.len()
        );
    }

    for rig in &graph.rigid_bodies {
        let body = out.rigid_bodies.get_mut(rig.source).ok_or_else(|| {
            RigError::DocumentMismatch(format!("rigid body '{}' has no model entry", rig.name))
        })?;
        let size = rig.size * unscale;
        body.size = match rig.shape {
            RigidShape::Box => host.convert_extent(size),
            _ => size,
        };
        body.shape = rig.shape;
        body.position = host.convert_vec(rig.position) * unscale;
        body.rotation = host.euler_from_host(rig.rotation);
        body.mass = rig.mass;
        body.linear_damping = rig.linear_damping;
        body.angular_damping = rig.angular_damping;
        body.restitution = rig.restitution;
        body.friction = rig.friction;
        body.group = rig.group;
        body.non_collision_mask = rig.non_collision_mask;
        body.mode = rig.kind;
    }

    for rig in &graph.joints {
        let joint = out.joints.get_mut(rig.source).ok_or_else(|| {
            RigError::DocumentMismatch(format!("joint '{}' has no model entry", rig.name))
        })?;
        joint.position = host.convert_vec(rig.position) * unscale;
        joint.rotation = host.euler_from_host(rig.rotation);
        let (lower, upper) = host.convert_range(rig.linear_lower, rig.linear_upper);
        joint.linear_lower = lower * unscale;
        joint.linear_upper = upper * unscale;
        let (lower, upper) = host.convert_angular_range(rig.angular_lower, rig.angular_upper);
        joint.angular_lower = lower;
        joint.angular_upper = upper;
        joint.spring_linear = host.convert_extent(rig.spring_linear);
        joint.spring_angular = host.convert_extent(rig.spring_angular);
    }

    log::debug!(
        "Exported rig '{}' at scale {} into {} bone(s)",
        graph.name,
        options.scale,
        out.bones.len()
    );
    Ok(out)
}
