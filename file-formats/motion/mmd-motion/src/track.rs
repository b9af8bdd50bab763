use crate::interpolation::find_key_index;

/// Anything stored on a frame of a track
pub trait Keyframe {
    fn frame(&self) -> u32;

    /// Same key moved to another frame
    fn set_frame(&mut self, frame: u32);
}

/// Keys of one channel with strictly increasing frames
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Track<K> {
    keys: Vec<K>,
}

impl<K> Default for Track<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K: Keyframe> Track<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, replacing any key already on the same frame.
    ///
    /// Returns the replaced key.
    pub fn insert(&mut self, key: K) -> Option<K> {
        match self.keys.binary_search_by_key(&key.frame(), Keyframe::frame) {
            Ok(index) => Some(std::mem::replace(&mut self.keys[index], key)),
            Err(index) => {
                self.keys.insert(index, key);
                None
            }
        }
    }

    pub fn get(&self, frame: u32) -> Option<&K> {
        self.keys
            .binary_search_by_key(&frame, Keyframe::frame)
            .ok()
            .map(|index| &self.keys[index])
    }

    /// Last key at or before `frame`
    pub fn key_at(&self, frame: u32) -> Option<&K> {
        find_key_index(&self.frames(), frame).map(|index| &self.keys[index])
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    pub fn frames(&self) -> Vec<u32> {
        self.keys.iter().map(Keyframe::frame).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// First and last frame
    pub fn frame_range(&self) -> Option<(u32, u32)> {
        Some((self.keys.first()?.frame(), self.keys.last()?.frame()))
    }

    /// Move every key by `offset` frames, keeping relative spacing
    pub fn shifted(&self, offset: u32) -> Self
    where
        K: Clone,
    {
        let keys = self
            .keys
            .iter()
            .map(|key| {
                let mut key = key.clone();
                key.set_frame(key.frame().saturating_add(offset));
                key
            })
            .collect();
        Self { keys }
    }
}

impl<K: Keyframe> FromIterator<K> for Track<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut track = Self::new();
        for key in iter {
            track.insert(key);
        }
        track
    }
}

impl<'a, K> IntoIterator for &'a Track<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

/// Named tracks in first-seen order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Channels<K> {
    entries: Vec<(String, Track<K>)>,
}

impl<K> Default for Channels<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<K: Keyframe> Channels<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key into the named track, creating the track on first use
    pub fn insert(&mut self, name: &str, key: K) -> Option<K> {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, track)) => track.insert(key),
            None => {
                let mut track = Track::new();
                track.insert(key);
                self.entries.push((name.to_string(), track));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Track<K>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, track)| track)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Track<K>)> {
        self.entries.iter().map(|(name, track)| (name.as_str(), track))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of named tracks
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys over all tracks
    pub fn key_count(&self) -> usize {
        self.entries.iter().map(|(_, track)| track.len()).sum()
    }

    pub fn frame_range(&self) -> Option<(u32, u32)> {
        self.entries
            .iter()
            .filter_map(|(_, track)| track.frame_range())
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }

    pub fn remove(&mut self, name: &str) -> Option<Track<K>> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }
}
