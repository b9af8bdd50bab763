use std::fs;
use std::path::Path;

use crate::channel::ChannelKind;
use crate::error::Result;
use crate::keys::{BoneKey, CameraKey, LightKey, MorphKey, PropertyKey, ShadowKey};
use crate::track::{Channels, Track};
use crate::version::MotionVersion;
use crate::vmd;

/// Model name used by camera and light motions
pub const CAMERA_MODEL_NAME: &str = "カメラ・照明";

/// In-memory motion
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct MotionDocument {
    pub version: MotionVersion,
    /// Name of the model the motion was recorded for
    pub model_name: String,
    pub bones: Channels<BoneKey>,
    pub morphs: Channels<MorphKey>,
    pub camera: Track<CameraKey>,
    pub lights: Track<LightKey>,
    pub shadows: Track<ShadowKey>,
    /// Visibility and IK switches
    pub properties: Track<PropertyKey>,
}

impl MotionDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        vmd::decode(data)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        vmd::encode(self)
    }

    /// Load a motion from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Save a motion to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn is_camera_motion(&self) -> bool {
        self.model_name == CAMERA_MODEL_NAME
    }

    /// Number of keys of one kind
    pub fn key_count(&self, kind: ChannelKind) -> usize {
        match kind {
            ChannelKind::Bone => self.bones.key_count(),
            ChannelKind::Morph => self.morphs.key_count(),
            ChannelKind::Camera => self.camera.len(),
            ChannelKind::Light => self.lights.len(),
            ChannelKind::Shadow => self.shadows.len(),
            ChannelKind::Visibility => self.properties.len(),
            ChannelKind::Ik => self.properties.iter().map(|k| k.ik_states.len()).sum(),
        }
    }

    /// Kinds with at least one key
    pub fn channel_kinds(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|&kind| self.key_count(kind) > 0)
            .collect()
    }

    /// Names of the IK bones switched by the property keys, in first-seen order
    pub fn ik_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for state in self.properties.iter().flat_map(|k| &k.ik_states) {
            if !names.contains(&state.name.as_str()) {
                names.push(&state.name);
            }
        }
        names
    }

    /// Enabled state of one IK bone per property key that mentions it
    pub fn ik_track(&self, name: &str) -> Vec<(u32, bool)> {
        self.properties
            .iter()
            .filter_map(|key| {
                key.ik_states
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| (key.frame, s.enabled))
            })
            .collect()
    }

    /// First and last keyed frame over every channel
    pub fn frame_range(&self) -> Option<(u32, u32)> {
        [
            self.bones.frame_range(),
            self.morphs.frame_range(),
            self.camera.frame_range(),
            self.lights.frame_range(),
            self.shadows.frame_range(),
            self.properties.frame_range(),
        ]
        .into_iter()
        .flatten()
        .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    /// Drop every channel whose kind is not listed
    pub fn retain_kinds(&mut self, kinds: &[ChannelKind]) {
        let keep = |kind| kinds.contains(&kind);
        if !keep(ChannelKind::Bone) {
            self.bones = Channels::new();
        }
        if !keep(ChannelKind::Morph) {
            self.morphs = Channels::new();
        }
        if !keep(ChannelKind::Camera) {
            self.camera = Track::new();
        }
        if !keep(ChannelKind::Light) {
            self.lights = Track::new();
        }
        if !keep(ChannelKind::Shadow) {
            self.shadows = Track::new();
        }
        match (keep(ChannelKind::Visibility), keep(ChannelKind::Ik)) {
            (true, true) => {}
            (false, false) => self.properties = Track::new(),
            (true, false) => {
                self.properties = self
                    .properties
                    .iter()
                    .map(|k| PropertyKey {
                        ik_states: Vec::new(),
                        ..k.clone()
                    })
                    .collect();
            }
            (false, true) => {
                self.properties = self
                    .properties
                    .iter()
                    .filter(|k| !k.ik_states.is_empty())
                    .map(|k| PropertyKey {
                        visible: true,
                        ..k.clone()
                    })
                    .collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::IkState;

    fn property(frame: u32, visible: bool, ik: &[(&str, bool)]) -> PropertyKey {
        PropertyKey {
            frame,
            visible,
            ik_states: ik
                .iter()
                .map(|&(name, enabled)| IkState {
                    name: name.to_string(),
                    enabled,
                })
                .collect(),
        }
    }

    #[test]
    fn test_ik_track() {
        let mut motion = MotionDocument::default();
        motion.properties.insert(property(0, true, &[("右足ＩＫ", true)]));
        motion
            .properties
            .insert(property(30, true, &[("左足ＩＫ", true), ("右足ＩＫ", false)]));

        assert_eq!(motion.ik_names(), vec!["右足ＩＫ", "左足ＩＫ"]);
        assert_eq!(motion.ik_track("右足ＩＫ"), vec![(0, true), (30, false)]);
        assert_eq!(motion.key_count(ChannelKind::Ik), 3);
    }

    #[test]
    fn test_retain_kinds() {
        let mut motion = MotionDocument::default();
        motion.morphs.insert(
            "あ",
            MorphKey {
                frame: 3,
                weight: 1.0,
            },
        );
        motion.properties.insert(property(0, false, &[("IK", true)]));

        motion.retain_kinds(&[ChannelKind::Ik]);
        assert!(motion.morphs.is_empty());
        assert_eq!(motion.channel_kinds(), vec![ChannelKind::Visibility, ChannelKind::Ik]);
        assert!(motion.properties.keys()[0].visible);
    }

    #[test]
    fn test_frame_range() {
        let mut motion = MotionDocument::default();
        assert_eq!(motion.frame_range(), None);
        motion.bones.insert(
            "センター",
            BoneKey {
                frame: 12,
                ..Default::default()
            },
        );
        motion.camera.insert(CameraKey {
            frame: 40,
            ..Default::default()
        });
        assert_eq!(motion.frame_range(), Some((12, 40)));
    }
}
