//! Host-agnostic rig description
//!
//! Everything in a [`RigGraph`] is already in host space and host units.
//! Entities refer to each other by their position in the graph's lists,
//! never by name.

use std::collections::HashMap;

use glam::{Quat, Vec2, Vec3};
use mmd_model::{MorphKind, PhysicsMode, RigidShape};

use crate::convention::HostConvention;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigInherit {
    pub parent: usize,
    pub weight: f32,
    pub rotation: bool,
    pub translation: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigIkLink {
    pub bone: usize,
    /// Angular `(lower, upper)` limits in host space
    pub limits: Option<(Vec3, Vec3)>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigIk {
    pub target: usize,
    pub loop_count: i32,
    pub limit_angle: f32,
    pub links: Vec<RigIkLink>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigBone {
    /// Display name, possibly rewritten by the left/right rename
    pub name: String,
    /// Name as stored in the model; motions bind against this
    pub source_name: String,
    pub name_en: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Rest head position in model space
    pub head: Vec3,
    /// Rest tail position in model space
    pub tail: Vec3,
    /// Local X and Z axes
    pub local_axes: Option<(Vec3, Vec3)>,
    pub fixed_axis: Option<Vec3>,
    pub transform_order: i32,
    pub transform_after_dynamics: bool,
    pub is_visible: bool,
    pub is_controllable: bool,
    pub is_tip: bool,
    pub is_ik: bool,
    pub inherit: Option<RigInherit>,
    pub ik: Option<RigIk>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyBinding {
    /// Index of the rigid body in the model
    pub source: usize,
    pub name: String,
    /// Bound bone; `None` marks a free body whose transform is its own
    pub bone: Option<usize>,
    pub kind: PhysicsMode,
    pub shape: RigidShape,
    pub size: Vec3,
    pub position: Vec3,
    pub rotation: Quat,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub group: u8,
    pub non_collision_mask: u16,
    pub hidden: bool,
}

impl RigidBodyBinding {
    pub fn is_free(&self) -> bool {
        self.bone.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct JointBinding {
    /// Index of the joint in the model
    pub source: usize,
    pub name: String,
    /// Bodies by position in [`RigGraph::rigid_bodies`]
    pub body_a: usize,
    pub body_b: usize,
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_lower: Vec3,
    pub linear_upper: Vec3,
    pub angular_lower: Vec3,
    pub angular_upper: Vec3,
    pub spring_linear: Vec3,
    pub spring_angular: Vec3,
    pub hidden: bool,
    pub is_spring: bool,
}

/// Why a pair of bodies never collides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum PairReason {
    /// One body's mask excludes the other's group
    Mask,
    /// Jointed bodies resting further apart than the configured distance
    Distance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct NonCollisionPair {
    /// Smaller body position first
    pub a: usize,
    pub b: usize,
    pub reason: PairReason,
}

/// Two-pass bone evaluation sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationOrder {
    pub before_dynamics: Vec<usize>,
    /// Run once physics has resolved
    pub after_dynamics: Vec<usize>,
}

impl EvaluationOrder {
    /// Both passes in sequence
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.before_dynamics
            .iter()
            .chain(&self.after_dynamics)
            .copied()
    }

    pub fn position(&self, bone: usize) -> Option<usize> {
        self.iter().position(|b| b == bone)
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MaterialRange {
    pub name: String,
    pub first_face: usize,
    pub face_count: usize,
    pub double_sided: bool,
    pub texture: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MeshMorph {
    pub name: String,
    /// `(vertex, offset)` pairs in host space
    pub offsets: Vec<(u32, Vec3)>,
}

/// Skinned mesh payload
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigMesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Normalised `(bone, weight)` influences per vertex
    pub weights: Vec<Vec<(usize, f32)>>,
    /// Triangles, wound for the host convention
    pub faces: Vec<[u32; 3]>,
    pub materials: Vec<MaterialRange>,
    pub morphs: Vec<MeshMorph>,
}

/// Morph name entry used for motion binding
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigMorph {
    pub name: String,
    pub kind: MorphKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RigGraph {
    pub name: String,
    pub convention: HostConvention,
    pub scale: f32,
    /// One entry per model bone, same order
    pub bones: Vec<RigBone>,
    pub evaluation_order: EvaluationOrder,
    pub rigid_bodies: Vec<RigidBodyBinding>,
    pub joints: Vec<JointBinding>,
    pub non_collision_pairs: Vec<NonCollisionPair>,
    pub mesh: RigMesh,
    pub morphs: Vec<RigMorph>,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    bone_names: HashMap<String, usize>,
    #[cfg_attr(feature = "serde-support", serde(skip))]
    morph_names: HashMap<String, usize>,
}

impl RigGraph {
    pub(crate) fn new(name: String, convention: HostConvention, scale: f32) -> Self {
        Self {
            name,
            convention,
            scale,
            ..Default::default()
        }
    }

    /// Rebuild the name indices; the first entry wins on duplicates
    pub fn index_names(&mut self) {
        self.bone_names.clear();
        for (index, bone) in self.bones.iter().enumerate() {
            self.bone_names
                .entry(bone.source_name.clone())
                .or_insert(index);
        }
        self.morph_names.clear();
        for (index, morph) in self.morphs.iter().enumerate() {
            self.morph_names.entry(morph.name.clone()).or_insert(index);
        }
    }

    /// Bone by its name in the model file
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bone_names.get(name).copied()
    }

    pub fn find_morph(&self, name: &str) -> Option<usize> {
        self.morph_names.get(name).copied()
    }

    pub fn roots(&self) -> Vec<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| i)
            .collect()
    }

    /// Depth of every bone below its root
    pub fn depths(&self) -> Vec<usize> {
        let mut depths = vec![0; self.bones.len()];
        let mut stack: Vec<(usize, usize)> = self.roots().into_iter().map(|r| (r, 0)).collect();
        while let Some((bone, depth)) = stack.pop() {
            depths[bone] = depth;
            stack.extend(self.bones[bone].children.iter().map(|&c| (c, depth + 1)));
        }
        depths
    }

    /// Whether the pair is listed as never colliding
    pub fn is_non_colliding(&self, a: usize, b: usize) -> bool {
        let (a, b) = (a.min(b), a.max(b));
        self.non_collision_pairs
            .iter()
            .any(|p| p.a == a && p.b == b)
    }

    pub fn rigid_body_by_source(&self, source: usize) -> Option<usize> {
        self.rigid_bodies.iter().position(|b| b.source == source)
    }
}
