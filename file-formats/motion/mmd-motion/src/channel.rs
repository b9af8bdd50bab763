use std::fmt;

use crate::error::MotionError;

/// Kinds of keyframe channel a motion file can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    Bone = 0,
    Morph = 1,
    Camera = 2,
    Light = 3,
    Shadow = 4,
    Visibility = 5,
    Ik = 6,
}

impl ChannelKind {
    /// All kinds in file order
    pub const ALL: [Self; 7] = [
        Self::Bone,
        Self::Morph,
        Self::Camera,
        Self::Light,
        Self::Shadow,
        Self::Visibility,
        Self::Ik,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bone => "bone",
            Self::Morph => "morph",
            Self::Camera => "camera",
            Self::Light => "light",
            Self::Shadow => "shadow",
            Self::Visibility => "visibility",
            Self::Ik => "ik",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }
}

impl TryFrom<u8> for ChannelKind {
    type Error = MotionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MotionError::UnknownChannelKind {
                tag: Some(value),
                offset: None,
            })
    }
}

impl From<ChannelKind> for u8 {
    fn from(kind: ChannelKind) -> Self {
        kind as u8
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_stable() {
        for (tag, kind) in ChannelKind::ALL.into_iter().enumerate() {
            assert_eq!(u8::from(kind) as usize, tag);
            assert_eq!(ChannelKind::try_from(tag as u8).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_tag() {
        assert!(matches!(
            ChannelKind::try_from(7),
            Err(MotionError::UnknownChannelKind { tag: Some(7), .. })
        ));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(ChannelKind::from_name("Camera"), Some(ChannelKind::Camera));
        assert_eq!(ChannelKind::from_name("wind"), None);
    }
}
