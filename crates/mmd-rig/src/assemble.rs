//! Model document to rig graph

use glam::Vec3;
use mmd_model::{Bone, BoneTail, IkChain, ModelDocument, RigidShape};

use crate::convention::HostConvention;
use crate::error::{Entity, Result, RigError, Warnings};
use crate::graph::{
    EvaluationOrder, JointBinding, NonCollisionPair, PairReason, RigBone, RigGraph, RigIk,
    RigIkLink, RigInherit, RigMorph, RigidBodyBinding,
};
use crate::mesh::build_mesh;
use crate::options::AssembleOptions;

/// A rig graph together with the recoverable problems met while building it
#[derive(Debug, Clone)]
pub struct Assembly {
    pub graph: RigGraph,
    pub warnings: Warnings,
}

/// Build a rig graph from a model document.
///
/// Fails on invalid options and on cyclic bone hierarchies. References
/// outside their target list are dropped and recorded in
/// [`Assembly::warnings`].
pub fn assemble(document: &ModelDocument, options: &AssembleOptions) -> Result<Assembly> {
    options.validate()?;
    check_hierarchy(&document.bones)?;

    let mut warnings = Warnings::new();
    let mut graph = RigGraph::new(
        document.info.name.clone(),
        options.convention,
        options.scale,
    );

    graph.bones = build_bones(document, options, &mut warnings);
    graph.evaluation_order = evaluation_order(&document.bones);
    graph.mesh = build_mesh(document, options.convention, options.scale, &mut warnings);
    graph.morphs = document
        .morphs
        .iter()
        .map(|m| RigMorph {
            name: m.name.clone(),
            kind: m.kind(),
        })
        .collect();
    build_physics(document, options, &mut graph, &mut warnings);
    graph.index_names();

    log::debug!(
        "Assembled '{}': {} bone(s), {} rigid bodies, {} joint(s), {} non-colliding pair(s)",
        graph.name,
        graph.bones.len(),
        graph.rigid_bodies.len(),
        graph.joints.len(),
        graph.non_collision_pairs.len()
    );
    Ok(Assembly { graph, warnings })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Fail when following parent links ever revisits a bone
fn check_hierarchy(bones: &[Bone]) -> Result<()> {
    let count = bones.len();
    let mut state = vec![Visit::New; count];
    for start in 0..count {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(bone) = current {
            match state[bone] {
                Visit::Done => break,
                Visit::Active => return Err(RigError::CyclicHierarchy { bone }),
                Visit::New => {
                    state[bone] = Visit::Active;
                    path.push(bone);
                    current = bones[bone]
                        .parent
                        .map(|p| p as usize)
                        .filter(|&p| p < count);
                }
            }
        }
        for bone in path {
            state[bone] = Visit::Done;
        }
    }
    Ok(())
}

/// Ascending transform order with ties kept in index order; bones evaluated
/// after physics form a second pass.
pub fn evaluation_order(bones: &[Bone]) -> EvaluationOrder {
    let mut indices: Vec<usize> = (0..bones.len()).collect();
    indices.sort_by_key(|&i| (bones[i].transform_order, i));
    let (after_dynamics, before_dynamics) = indices
        .into_iter()
        .partition(|&i| bones[i].transform_after_dynamics());
    EvaluationOrder {
        before_dynamics,
        after_dynamics,
    }
}

/// Move the last left/right token of a bone name into a `.L`/`.R` suffix
pub fn rename_left_right(name: &str) -> String {
    let left = name.rfind('左');
    let right = name.rfind('右');
    let (at, token, suffix) = match (left, right) {
        (Some(l), Some(r)) if r > l => (r, '右', ".R"),
        (Some(l), _) => (l, '左', ".L"),
        (None, Some(r)) => (r, '右', ".R"),
        (None, None) => return name.to_string(),
    };
    let mut renamed = String::with_capacity(name.len() + 2);
    renamed.push_str(&name[..at]);
    renamed.push_str(&name[at + token.len_utf8()..]);
    renamed.push_str(suffix);
    renamed
}

/// Reference into a list of `len` entries, recording a warning when it
/// points past the end
fn resolve(
    warnings: &mut Warnings,
    entity: Entity,
    index: usize,
    field: &'static str,
    reference: Option<u32>,
    len: usize,
) -> Option<usize> {
    let reference = reference?;
    if (reference as usize) < len {
        Some(reference as usize)
    } else {
        warnings.dangling(entity, index, field, reference);
        None
    }
}

fn build_ik(
    chain: &IkChain,
    index: usize,
    count: usize,
    host: HostConvention,
    warnings: &mut Warnings,
) -> Option<RigIk> {
    let target = resolve(warnings, Entity::Bone, index, "ik target", chain.target, count)?;
    let links = chain
        .links
        .iter()
        .filter_map(|link| {
            let bone = resolve(warnings, Entity::Bone, index, "ik link", link.bone, count)?;
            Some(RigIkLink {
                bone,
                limits: link
                    .limits
                    .map(|(lower, upper)| host.convert_angular_range(lower, upper)),
            })
        })
        .collect();
    Some(RigIk {
        target,
        loop_count: chain.loop_count,
        limit_angle: chain.limit_angle,
        links,
    })
}

fn build_bones(
    document: &ModelDocument,
    options: &AssembleOptions,
    warnings: &mut Warnings,
) -> Vec<RigBone> {
    let host = options.convention;
    let scale = options.scale;
    let count = document.bones.len();
    let heads: Vec<Vec3> = document
        .bones
        .iter()
        .map(|b| host.convert_vec(b.position * scale))
        .collect();

    let mut bones: Vec<RigBone> = document
        .bones
        .iter()
        .enumerate()
        .map(|(index, bone)| {
            let head = heads[index];
            let tail = match bone.tail {
                BoneTail::Offset(offset) => head + host.convert_vec(offset * scale),
                BoneTail::Bone(target) => {
                    match resolve(warnings, Entity::Bone, index, "tail", target, count) {
                        Some(target) => heads[target],
                        None => head,
                    }
                }
            };
            let inherit = bone.inherit.as_ref().and_then(|link| {
                let parent =
                    resolve(warnings, Entity::Bone, index, "inherit parent", link.parent, count)?;
                Some(RigInherit {
                    parent,
                    weight: link.weight,
                    rotation: link.rotation,
                    translation: link.translation,
                })
            });
            let ik = bone
                .ik
                .as_ref()
                .and_then(|chain| build_ik(chain, index, count, host, warnings));

            RigBone {
                name: if options.rename_bones {
                    rename_left_right(&bone.name)
                } else {
                    bone.name.clone()
                },
                source_name: bone.name.clone(),
                name_en: bone.name_en.clone(),
                parent: resolve(warnings, Entity::Bone, index, "parent", bone.parent, count),
                children: Vec::new(),
                head,
                tail,
                local_axes: bone
                    .local_axes
                    .map(|axes| (host.convert_vec(axes.x), host.convert_vec(axes.z))),
                fixed_axis: bone.fixed_axis.map(|axis| host.convert_vec(axis)),
                transform_order: bone.transform_order,
                transform_after_dynamics: bone.transform_after_dynamics(),
                is_visible: bone.is_visible(),
                is_controllable: bone.is_controllable(),
                is_tip: bone.is_tip(),
                is_ik: ik.is_some(),
                inherit,
                ik,
            }
        })
        .collect();

    for index in 0..bones.len() {
        if let Some(parent) = bones[index].parent {
            bones[parent].children.push(index);
        }
    }
    bones
}

fn build_physics(
    document: &ModelDocument,
    options: &AssembleOptions,
    graph: &mut RigGraph,
    warnings: &mut Warnings,
) {
    let host = options.convention;
    let scale = options.scale;
    let bone_count = document.bones.len();

    // Position of each model body in the graph, `None` when left out
    let mut placed: Vec<Option<usize>> = vec![None; document.rigid_bodies.len()];
    for (index, body) in document.rigid_bodies.iter().enumerate() {
        let bone = match body.bone {
            Some(bone) if bone as usize >= bone_count => {
                warnings.dangling(Entity::RigidBody, index, "bone", bone);
                continue;
            }
            bone => bone.map(|b| b as usize),
        };
        if options.only_collisions && (!body.is_dynamic() || body.mass <= 0.0) {
            log::debug!("Leaving out bone-following rigid body '{}'", body.name);
            continue;
        }

        let size = match body.shape {
            RigidShape::Box => host.convert_extent(body.size),
            _ => body.size,
        };
        placed[index] = Some(graph.rigid_bodies.len());
        graph.rigid_bodies.push(RigidBodyBinding {
            source: index,
            name: body.name.clone(),
            bone,
            kind: body.mode,
            shape: body.shape,
            size: size * scale,
            position: host.convert_vec(body.position * scale),
            rotation: host.convert_euler(body.rotation),
            mass: body.mass,
            linear_damping: body.linear_damping,
            angular_damping: body.angular_damping,
            restitution: body.restitution,
            friction: body.friction,
            group: body.group,
            non_collision_mask: body.non_collision_mask,
            hidden: options.hide_rigids,
        });
    }

    for (index, joint) in document.joints.iter().enumerate() {
        let mut end = |field: &'static str, reference: Option<u32>| -> Option<usize> {
            let reference = reference?;
            match placed.get(reference as usize) {
                Some(slot) => *slot,
                None => {
                    warnings.dangling(Entity::Joint, index, field, reference);
                    None
                }
            }
        };
        let body_a = end("body_a", joint.body_a);
        let body_b = end("body_b", joint.body_b);
        let (Some(body_a), Some(body_b)) = (body_a, body_b) else {
            log::debug!("Leaving out joint '{}' without two bodies", joint.name);
            continue;
        };

        let (linear_lower, linear_upper) =
            host.convert_range(joint.linear_lower * scale, joint.linear_upper * scale);
        let (angular_lower, angular_upper) =
            host.convert_angular_range(joint.angular_lower, joint.angular_upper);
        graph.joints.push(JointBinding {
            source: index,
            name: joint.name.clone(),
            body_a,
            body_b,
            position: host.convert_vec(joint.position * scale),
            rotation: host.convert_euler(joint.rotation),
            linear_lower,
            linear_upper,
            angular_lower,
            angular_upper,
            spring_linear: host.convert_extent(joint.spring_linear),
            spring_angular: host.convert_extent(joint.spring_angular),
            hidden: options.hide_rigids,
            is_spring: joint.has_spring(),
        });
    }

    let source = |body: usize| &document.rigid_bodies[graph.rigid_bodies[body].source];
    let mut pairs = Vec::new();
    for a in 0..graph.rigid_bodies.len() {
        for b in a + 1..graph.rigid_bodies.len() {
            if source(a).is_masked_against(source(b)) {
                pairs.push(NonCollisionPair {
                    a,
                    b,
                    reason: PairReason::Mask,
                });
            }
        }
    }

    if options.ignore_non_collision_groups {
        for joint in &graph.joints {
            let (a, b) = (
                joint.body_a.min(joint.body_b),
                joint.body_a.max(joint.body_b),
            );
            if a == b || pairs.iter().any(|p: &NonCollisionPair| p.a == a && p.b == b) {
                continue;
            }
            // Compared in file units, before scaling
            let distance = source(a).position.distance(source(b).position);
            if distance > options.distance_of_ignore_collisions {
                log::trace!("Excluding '{}' pair at rest distance {distance}", joint.name);
                pairs.push(NonCollisionPair {
                    a,
                    b,
                    reason: PairReason::Distance,
                });
            }
        }
    }
    graph.non_collision_pairs = pairs;
}
