//! Command implementations for each file kind

pub mod model;
pub mod motion;

use clap::{Args, ValueEnum};
use mmd_rig::{DEFAULT_SCALE, HostConvention};

/// Axis convention of the scene a rig is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConventionArg {
    /// Left-handed, Y up (the model files' own convention)
    LeftYUp,
    /// Right-handed, Y up
    RightYUp,
    /// Right-handed, Z up
    RightZUp,
}

impl From<ConventionArg> for HostConvention {
    fn from(arg: ConventionArg) -> Self {
        match arg {
            ConventionArg::LeftYUp => HostConvention::LeftHandedYUp,
            ConventionArg::RightYUp => HostConvention::RightHandedYUp,
            ConventionArg::RightZUp => HostConvention::RightHandedZUp,
        }
    }
}

/// Scene space options shared by the rig and retarget commands
#[derive(Debug, Clone, Args)]
pub struct SceneArgs {
    /// Length scale from file units to scene units
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    pub scale: f32,

    /// Axis convention of the target scene
    #[arg(long, value_enum, default_value_t = ConventionArg::RightZUp)]
    pub convention: ConventionArg,
}
