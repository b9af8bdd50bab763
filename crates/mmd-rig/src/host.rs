//! Hand-off to a host scene graph
//!
//! A host implements [`SceneHost`]; [`build_scene`] and [`apply_motion`]
//! walk a rig graph or a set of retargeted curves and call it once per
//! entity. Both consume their input, so nothing here keeps a reference to
//! what the host created.

use crate::convention::HostConvention;
use crate::curve::{AnimationCurve, SteppedCurve};
use crate::graph::{
    EvaluationOrder, JointBinding, NonCollisionPair, RigBone, RigGraph, RigMesh, RigidBodyBinding,
};
use crate::options::{AssembleOptions, RetargetOptions};
use crate::retarget::Retargeted;

/// Float property a curve animates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveTarget {
    BoneLocation { bone: usize, axis: usize },
    /// Component 0 is W, then X, Y and Z
    BoneRotation { bone: usize, component: usize },
    MorphWeight { morph: usize },
    CameraDistance,
    CameraTarget { axis: usize },
    CameraRotation { axis: usize },
    CameraFov,
    LightColor { channel: usize },
    LightDirection { axis: usize },
    ShadowDistance,
}

/// On/off property a stepped curve switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchTarget {
    ModelVisible,
    IkEnabled { bone: usize },
    CameraPerspective,
}

/// Scene graph a rig and its motions are handed to
pub trait SceneHost {
    type Error;

    /// Handedness and up axis of the scene
    fn convention(&self) -> HostConvention;

    /// Playback rate in frames per second
    fn frame_rate(&self) -> f32;

    fn create_skeleton(
        &mut self,
        name: &str,
        bones: &[RigBone],
        order: &EvaluationOrder,
    ) -> Result<(), Self::Error>;

    fn create_mesh(&mut self, mesh: &RigMesh) -> Result<(), Self::Error>;

    fn create_rigid_body(&mut self, body: &RigidBodyBinding) -> Result<(), Self::Error>;

    fn create_joint(&mut self, joint: &JointBinding) -> Result<(), Self::Error>;

    /// Bodies that must never collide; hosts without pair filters may ignore this
    fn exclude_collision(&mut self, _pair: &NonCollisionPair) -> Result<(), Self::Error> {
        Ok(())
    }

    fn create_curve(&mut self, target: CurveTarget, curve: &AnimationCurve)
    -> Result<(), Self::Error>;

    fn create_switch(
        &mut self,
        target: SwitchTarget,
        curve: &SteppedCurve<bool>,
    ) -> Result<(), Self::Error>;

    fn create_shadow_mode(&mut self, _curve: &SteppedCurve<u8>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Frames a motion covers; hosts may adopt it as their playback range
    fn set_frame_range(&mut self, _first: u32, _last: u32) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl AssembleOptions {
    /// Defaults with the host's convention
    pub fn for_host<H: SceneHost + ?Sized>(host: &H) -> Self {
        Self {
            convention: host.convention(),
            ..Default::default()
        }
    }
}

impl RetargetOptions {
    /// Defaults with the host's convention and frame rate
    pub fn for_host<H: SceneHost + ?Sized>(host: &H) -> Self {
        Self {
            convention: host.convention(),
            frame_rate: host.frame_rate(),
            ..Default::default()
        }
    }
}

/// Create every rig entity in the host: skeleton, mesh, rigid bodies,
/// joints, then collision exclusions
pub fn build_scene<H: SceneHost + ?Sized>(host: &mut H, graph: RigGraph) -> Result<(), H::Error> {
    if graph.convention != host.convention() {
        log::warn!(
            "Rig '{}' was assembled for {:?} but the host uses {:?}",
            graph.name,
            graph.convention,
            host.convention()
        );
    }
    host.create_skeleton(&graph.name, &graph.bones, &graph.evaluation_order)?;
    host.create_mesh(&graph.mesh)?;
    for body in &graph.rigid_bodies {
        host.create_rigid_body(body)?;
    }
    for joint in &graph.joints {
        host.create_joint(joint)?;
    }
    for pair in &graph.non_collision_pairs {
        host.exclude_collision(pair)?;
    }
    Ok(())
}

/// Create every curve of a retargeted motion in the host
pub fn apply_motion<H: SceneHost + ?Sized>(host: &mut H, motion: Retargeted) -> Result<(), H::Error> {
    for curves in &motion.bones {
        let bone = curves.bone;
        for (axis, curve) in curves.location.iter().enumerate() {
            host.create_curve(CurveTarget::BoneLocation { bone, axis }, curve)?;
        }
        for (component, curve) in curves.rotation.iter().enumerate() {
            host.create_curve(CurveTarget::BoneRotation { bone, component }, curve)?;
        }
    }
    for curve in &motion.morphs {
        host.create_curve(CurveTarget::MorphWeight { morph: curve.morph }, &curve.weight)?;
    }
    if let Some(camera) = &motion.camera {
        host.create_curve(CurveTarget::CameraDistance, &camera.distance)?;
        for axis in 0..3 {
            host.create_curve(CurveTarget::CameraTarget { axis }, &camera.target[axis])?;
            host.create_curve(CurveTarget::CameraRotation { axis }, &camera.rotation[axis])?;
        }
        host.create_curve(CurveTarget::CameraFov, &camera.fov)?;
        host.create_switch(SwitchTarget::CameraPerspective, &camera.perspective)?;
    }
    if let Some(light) = &motion.light {
        for axis in 0..3 {
            host.create_curve(CurveTarget::LightColor { channel: axis }, &light.color[axis])?;
            host.create_curve(CurveTarget::LightDirection { axis }, &light.direction[axis])?;
        }
    }
    if let Some(shadow) = &motion.shadow {
        host.create_curve(CurveTarget::ShadowDistance, &shadow.distance)?;
        host.create_shadow_mode(&shadow.mode)?;
    }
    if !motion.visibility.is_empty() {
        host.create_switch(SwitchTarget::ModelVisible, &motion.visibility)?;
    }
    for curve in &motion.ik {
        host.create_switch(SwitchTarget::IkEnabled { bone: curve.bone }, &curve.enabled)?;
    }
    if let Some((first, last)) = motion.frame_range {
        host.set_frame_range(first, last)?;
    }
    Ok(())
}
