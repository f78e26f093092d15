use super::types::{ImportOptions, ImportedAnimation, ImportedChannel, Key};
use crate::{
    animation::{slerp, weight, AnimationClip, BoneTrack, Sqt},
    skeleton::Skeleton,
};
use itertools::Itertools;
use log::{debug, warn};
use nalgebra_glm as glm;
use std::cmp::Ordering;

/// Keys closer than this many seconds are merged into one sample
const TIME_EPSILON: f64 = 0.001;

/// Value of a key list at `time`. Before the first key the first value is
/// held, after the last key the last value is held. `None` for no keys.
fn sample_keys<T: Copy>(
    keys: &[Key<T>],
    time: f64,
    blend: fn(&T, &T, f32) -> T,
) -> Option<T> {
    let (first, last) = (keys.first()?, keys.last()?);
    if time <= first.time {
        return Some(first.value);
    }
    if time >= last.time {
        return Some(last.value);
    }
    keys.iter()
        .tuple_windows()
        .find(|(a, b)| a.time <= time && time < b.time)
        .map_or(Some(last.value), |(a, b)| {
            Some(blend(&a.value, &b.value, weight(a.time, b.time, time)))
        })
}

fn lerp_vec3(a: &glm::Vec3, b: &glm::Vec3, f: f32) -> glm::Vec3 {
    glm::lerp(a, b, f)
}

/// Converts key times from ticks to seconds
fn to_seconds<T: Copy>(keys: &[Key<T>], ticks_per_second: f64) -> Vec<Key<T>> {
    keys.iter()
        .map(|k| Key {
            time: k.time / ticks_per_second,
            value: k.value,
        })
        .collect()
}

/// Merges the separately keyed components of a channel into one sample per
/// distinct key time. Components that aren't keyed at a time are
/// interpolated from their neighbours, and components with no keys at all
/// use the node's bind transform.
fn build_track(
    channel: &ImportedChannel,
    skeleton: &Skeleton,
    ticks_per_second: f64,
) -> BoneTrack {
    let bind = skeleton
        .find(&channel.node_name)
        .and_then(|i| skeleton.node(i))
        .map_or_else(
            || {
                warn!("channel {} targets no node", channel.node_name);
                Sqt::default()
            },
            |node| Sqt::from_mat4(0.0, &node.local_bind),
        );

    let scale_keys = to_seconds(&channel.scale_keys, ticks_per_second);
    let translation_keys =
        to_seconds(&channel.translation_keys, ticks_per_second);
    let rotation_keys: Vec<Key<glm::Quat>> =
        to_seconds(&channel.rotation_keys, ticks_per_second)
            .into_iter()
            .map(|k| Key {
                time: k.time,
                value: glm::quat_normalize(&k.value),
            })
            .collect();

    // The components may use different key times. Collect all of them so
    // each one becomes a sample.
    let mut times: Vec<f64> = scale_keys
        .iter()
        .map(|k| k.time)
        .chain(rotation_keys.iter().map(|k| k.time))
        .chain(translation_keys.iter().map(|k| k.time))
        .collect();
    // If there are NaNs consider them equal
    times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    times.dedup_by(|a, b| (*a - *b).abs() < TIME_EPSILON);

    let samples = times
        .into_iter()
        .map(|time| Sqt {
            time,
            scale: sample_keys(&scale_keys, time, lerp_vec3)
                .unwrap_or(bind.scale),
            rotation: sample_keys(&rotation_keys, time, slerp)
                .unwrap_or(bind.rotation),
            translation: sample_keys(&translation_keys, time, lerp_vec3)
                .unwrap_or(bind.translation),
        })
        .collect();

    BoneTrack::new(channel.node_name.clone(), samples)
}

/// Builds a playable clip from imported channels. Times are converted from
/// ticks to seconds using the file's rate, or `default_ticks_per_second`
/// when the file doesn't give one.
#[must_use]
pub fn build_clip(
    raw: &ImportedAnimation,
    skeleton: &Skeleton,
    options: &ImportOptions,
) -> AnimationClip {
    let ticks_per_second =
        if raw.ticks_per_second.is_finite() && raw.ticks_per_second > 0.0 {
            raw.ticks_per_second
        } else {
            let rate = options.ticks_per_second();
            debug!("animation {} has no tick rate, using {}", raw.name, rate);
            rate
        };

    let tracks: Vec<BoneTrack> = raw
        .channels
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| build_track(c, skeleton, ticks_per_second))
        .collect();

    let duration = if raw.duration.is_finite() && raw.duration > 0.0 {
        raw.duration / ticks_per_second
    } else {
        tracks
            .iter()
            .filter_map(|t| t.samples.last().map(|s| s.time))
            .fold(0.0, f64::max)
    };
    debug!(
        "clip {} duration={} tracks={}",
        raw.name,
        duration,
        tracks.len()
    );

    AnimationClip::new(raw.name.clone(), duration, ticks_per_second, tracks)
}
