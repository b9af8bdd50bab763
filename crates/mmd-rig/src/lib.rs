//! Rig assembly, export and motion retargeting for MikuMikuDance models.
//!
//! [`assemble`] turns a decoded [`mmd_model::ModelDocument`] into a
//! host-agnostic [`RigGraph`]: a resolved bone hierarchy with a two-pass
//! evaluation order, a skinned mesh, rigid body and joint bindings and the
//! list of body pairs that never collide. Everything is converted to the
//! host's [`HostConvention`] and scaled to host units on the way.
//! [`export_rig`] runs the same conversion backwards, and [`retarget`]
//! binds a [`mmd_motion::MotionDocument`] to a graph by name.
//!
//! ```
//! use mmd_model::{Bone, ModelDocument};
//! use mmd_rig::{AssembleOptions, HostConvention, assemble};
//!
//! let mut model = ModelDocument::default();
//! model.bones.push(Bone {
//!     name: "センター".into(),
//!     position: glam::Vec3::new(0.0, 20.0, 0.0),
//!     ..Default::default()
//! });
//!
//! let options = AssembleOptions {
//!     scale: 0.08,
//!     convention: HostConvention::RightHandedYUp,
//!     ..Default::default()
//! };
//! let assembly = assemble(&model, &options).unwrap();
//! let head = assembly.graph.bones[0].head;
//! assert!((head - glam::Vec3::new(0.0, 1.6, 0.0)).length() < 1e-6);
//! ```

#![forbid(unsafe_code)]

pub mod assemble;
pub mod convention;
pub mod curve;
pub mod error;
pub mod export;
pub mod graph;
pub mod host;
mod mesh;
pub mod options;
pub mod retarget;

pub use assemble::{Assembly, assemble, evaluation_order, rename_left_right};
pub use convention::HostConvention;
pub use curve::{AnimationCurve, CurveKey, SteppedCurve};
pub use error::{Entity, Result, RigError, RigWarning, Warnings};
pub use export::export_rig;
pub use graph::{
    EvaluationOrder, JointBinding, MaterialRange, MeshMorph, NonCollisionPair, PairReason,
    RigBone, RigGraph, RigIk, RigIkLink, RigInherit, RigMesh, RigMorph, RigidBodyBinding,
};
pub use host::{CurveTarget, SceneHost, SwitchTarget, apply_motion, build_scene};
pub use options::{AssembleOptions, DEFAULT_SCALE, ExportOptions, RetargetOptions};
pub use retarget::{
    BoneCurves, CameraCurves, IkCurve, LightCurves, MorphCurve, Retargeted, ShadowCurves,
    options_for, retarget,
};
