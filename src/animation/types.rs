use crate::dualquat;
use ahash::{HashMap, HashMapExt};
use log::warn;
use nalgebra_glm as glm;
use std::cmp::Ordering;

/// Scale, rotation and translation of one bone at one keyframe. `time` is in
/// seconds from the start of the clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sqt {
    pub time: f64,
    pub scale: glm::Vec3,
    pub rotation: glm::Quat,
    pub translation: glm::Vec3,
}

impl Default for Sqt {
    fn default() -> Self {
        Self::identity(0.0)
    }
}

impl Sqt {
    #[must_use]
    pub fn identity(time: f64) -> Self {
        Self {
            time,
            scale: glm::vec3(1.0, 1.0, 1.0),
            rotation: glm::Quat::identity(),
            translation: glm::Vec3::zeros(),
        }
    }

    /// Decomposes a `T * R * S` matrix
    #[must_use]
    pub fn from_mat4(time: f64, m: &glm::Mat4) -> Self {
        let (rotation, scale) = dualquat::rotation_and_scale(m);
        Self {
            time,
            scale,
            rotation,
            translation: dualquat::translation_of(m),
        }
    }

    /// Local transform as `Translation * Rotation * Scale`
    #[must_use]
    pub fn to_mat4(&self) -> glm::Mat4 {
        glm::translation(&self.translation)
            * glm::quat_to_mat4(&glm::quat_normalize(&self.rotation))
            * glm::scaling(&self.scale)
    }
}

/// Keyframes for one bone, ordered by time. May be empty.
#[derive(Clone, Debug, Default)]
pub struct BoneTrack {
    pub bone_name: String,
    pub samples: Vec<Sqt>,
}

impl BoneTrack {
    #[must_use]
    pub fn new(bone_name: impl Into<String>, samples: Vec<Sqt>) -> Self {
        Self {
            bone_name: bone_name.into(),
            samples,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn is_sorted(&self) -> bool {
        self.samples.windows(2).all(|w| w[0].time <= w[1].time)
    }
}

/// One named animation. Nothing can change a clip after it is built, so it
/// can be shared freely between evaluators.
#[derive(Clone, Debug)]
pub struct AnimationClip {
    name: String,
    duration: f64,
    ticks_per_second: f64,
    tracks: HashMap<String, BoneTrack>,
}

impl AnimationClip {
    /// `duration` is in seconds. Tracks are keyed by bone name; a later track
    /// with the same name replaces an earlier one.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        duration: f64,
        ticks_per_second: f64,
        tracks: Vec<BoneTrack>,
    ) -> Self {
        let name = name.into();
        let mut map = HashMap::with_capacity(tracks.len());
        for mut track in tracks {
            if !track.is_sorted() {
                warn!(
                    "clip {} track {} has unsorted samples, sorting",
                    name, track.bone_name
                );
                // Stable, so samples sharing a time keep their order. NaN
                // times compare equal and end up wherever they were.
                track.samples.sort_by(|a, b| {
                    a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal)
                });
            }
            if let Some(old) = map.insert(track.bone_name.clone(), track) {
                warn!("clip {} has duplicate track {}", name, old.bone_name);
            }
        }
        Self {
            name,
            duration,
            ticks_per_second,
            tracks: map,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of the clip in seconds
    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub const fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    /// Seconds per authored tick, or 0 if the rate is unknown
    #[must_use]
    pub fn frame_duration(&self) -> f64 {
        if self.ticks_per_second > 0.0 {
            1.0 / self.ticks_per_second
        } else {
            0.0
        }
    }

    /// Track for a bone, or `None` if this clip doesn't animate it
    #[must_use]
    pub fn track(&self, bone_name: &str) -> Option<&BoneTrack> {
        self.tracks.get(bone_name)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &BoneTrack> {
        self.tracks.values()
    }

    #[must_use]
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Largest sample count of any track. Tracks are allowed to have
    /// different lengths.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.tracks.values().map(BoneTrack::len).max().unwrap_or(0)
    }
}
