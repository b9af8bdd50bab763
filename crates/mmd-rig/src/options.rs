use crate::convention::HostConvention;
use crate::error::{Result, RigError};

/// Source-to-host unit scale used when nothing else is requested
pub const DEFAULT_SCALE: f32 = 0.2;

fn check_scale(scale: f32) -> Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(RigError::InvalidOption {
            name: "scale",
            reason: format!("must be a positive number, got {scale}"),
        })
    }
}

/// Options for [`crate::assemble`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct AssembleOptions {
    /// Uniform factor applied to every length
    pub scale: f32,
    /// Rewrite left/right name tokens into `.L`/`.R` suffixes
    pub rename_bones: bool,
    /// Tag constructed rigid bodies and joints as hidden
    pub hide_rigids: bool,
    /// Keep only simulated bodies with mass
    pub only_collisions: bool,
    /// Exclude jointed pairs that rest further apart than
    /// `distance_of_ignore_collisions`
    pub ignore_non_collision_groups: bool,
    /// Rest separation threshold, in file units
    pub distance_of_ignore_collisions: f32,
    pub convention: HostConvention,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            rename_bones: true,
            hide_rigids: true,
            only_collisions: false,
            ignore_non_collision_groups: false,
            distance_of_ignore_collisions: 1.5,
            convention: HostConvention::default(),
        }
    }
}

impl AssembleOptions {
    pub fn validate(&self) -> Result<()> {
        check_scale(self.scale)?;
        let distance = self.distance_of_ignore_collisions;
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(RigError::InvalidOption {
                name: "distance_of_ignore_collisions",
                reason: format!("must be zero or positive, got {distance}"),
            });
        }
        Ok(())
    }
}

/// Options for [`crate::retarget`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct RetargetOptions {
    pub scale: f32,
    /// Frames added in front of every key
    pub frame_margin: u32,
    pub convention: HostConvention,
    /// Playback rate declared by the host, frames per second
    pub frame_rate: f32,
}

impl Default for RetargetOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            frame_margin: 5,
            convention: HostConvention::default(),
            frame_rate: 30.0,
        }
    }
}

impl RetargetOptions {
    pub fn validate(&self) -> Result<()> {
        check_scale(self.scale)?;
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(RigError::InvalidOption {
                name: "frame_rate",
                reason: format!("must be a positive number, got {}", self.frame_rate),
            });
        }
        Ok(())
    }
}

/// Options for [`crate::export_rig`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct ExportOptions {
    /// Factor the rig was assembled with; lengths are divided by it
    pub scale: f32,
    pub convention: HostConvention,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            convention: HostConvention::default(),
        }
    }
}

impl ExportOptions {
    pub fn validate(&self) -> Result<()> {
        check_scale(self.scale)
    }
}

impl From<&AssembleOptions> for ExportOptions {
    fn from(options: &AssembleOptions) -> Self {
        Self {
            scale: options.scale,
            convention: options.convention,
        }
    }
}
