use std::fmt;

use mmd_model::ModelError;
use mmd_motion::{ChannelKind, MotionError};
use thiserror::Error;

/// Error types for rig assembly, export and retargeting
#[derive(Error, Debug)]
pub enum RigError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Motion(#[from] MotionError),

    /// An option is outside its accepted range
    #[error("Invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// Following parent links from `bone` leads back to `bone`
    #[error("Cyclic bone hierarchy through bone {bone}")]
    CyclicHierarchy { bone: usize },

    /// The rig was not assembled from the document it is exported into
    #[error("Rig does not match document: {0}")]
    DocumentMismatch(String),
}

/// Result type using RigError
pub type Result<T> = std::result::Result<T, RigError>;

/// Kind of entity a warning refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum Entity {
    Bone,
    Vertex,
    Face,
    Material,
    Morph,
    RigidBody,
    Joint,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bone => "bone",
            Self::Vertex => "vertex",
            Self::Face => "face",
            Self::Material => "material",
            Self::Morph => "morph",
            Self::RigidBody => "rigid body",
            Self::Joint => "joint",
        })
    }
}

/// Recoverable condition recorded while assembling or retargeting
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub enum RigWarning {
    /// `entity` number `index` points past the end of the referenced list.
    /// The reference, or the whole entry when it cannot stand without it, was dropped.
    DanglingReference {
        entity: Entity,
        index: usize,
        field: &'static str,
        reference: u32,
    },
    /// A motion channel names nothing in the rig
    NameBindingMiss { channel: ChannelKind, name: String },
}

impl fmt::Display for RigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                entity,
                index,
                field,
                reference,
            } => write!(
                f,
                "Dangling reference: {entity} {index} {field} points to missing index {reference}"
            ),
            Self::NameBindingMiss { channel, name } => {
                write!(f, "No rig entity for {channel} channel '{name}'")
            }
        }
    }
}

/// Warning log returned next to a successful result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct Warnings {
    entries: Vec<RigWarning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and forward it to the log
    pub fn push(&mut self, warning: RigWarning) {
        log::warn!("{warning}");
        self.entries.push(warning);
    }

    pub(crate) fn dangling(&mut self, entity: Entity, index: usize, field: &'static str, reference: u32) {
        self.push(RigWarning::DanglingReference {
            entity,
            index,
            field,
            reference,
        });
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RigWarning> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dangling references recorded for one entity kind
    pub fn dangling_references(&self, entity: Entity) -> usize {
        self.entries
            .iter()
            .filter(|w| matches!(w, RigWarning::DanglingReference { entity: e, .. } if *e == entity))
            .count()
    }

    /// Channel names that did not bind, in recorded order
    pub fn binding_misses(&self) -> Vec<(ChannelKind, &str)> {
        self.entries
            .iter()
            .filter_map(|w| match w {
                RigWarning::NameBindingMiss { channel, name } => Some((*channel, name.as_str())),
                RigWarning::DanglingReference { .. } => None,
            })
            .collect()
    }

    pub fn into_vec(self) -> Vec<RigWarning> {
        self.entries
    }

    /// Human readable multi-line summary
    pub fn format(&self) -> String {
        if self.entries.is_empty() {
            return "No warnings".to_string();
        }
        let mut out = format!("{} warning(s):", self.entries.len());
        for (i, warning) in self.entries.iter().enumerate() {
            out.push_str(&format!("\n  {}. {warning}", i + 1));
        }
        out
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a RigWarning;
    type IntoIter = std::slice::Iter<'a, RigWarning>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
