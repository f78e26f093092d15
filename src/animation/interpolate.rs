use super::types::Sqt;
use nalgebra_glm as glm;

/// Above this cosine two rotations are close enough that a normalized lerp
/// stands in for slerp
const SLERP_EPSILON: f32 = 0.0005;

/// Where a time falls within a track
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Bracket {
    /// Before the first sample, after the last one, or the only sample
    Clamp(usize),
    /// Between sample `i` and `i + 1` with blend factor `f`
    Between(usize, f32),
}

/// Helper to calculate the parameter used for interpolation. A window with
/// no span gives 0.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn weight(start: f64, end: f64, current: f64) -> f32 {
    if end > start {
        ((current - start) / (end - start)).clamp(0.0, 1.0) as f32
    } else {
        0.0
    }
}

/// Finds the samples around `time`. Tracks are short so a linear scan is
/// fine. `samples` must not be empty.
pub(crate) fn bracket(samples: &[Sqt], time: f64) -> Bracket {
    let last = samples.len().saturating_sub(1);
    if time <= samples[0].time {
        return Bracket::Clamp(0);
    }
    if time >= samples[last].time {
        return Bracket::Clamp(last);
    }
    for (i, pair) in samples.windows(2).enumerate() {
        if pair[0].time <= time && time < pair[1].time {
            return Bracket::Between(i, weight(pair[0].time, pair[1].time, time));
        }
    }
    // Only reachable with NaN times
    Bracket::Clamp(last)
}

/// Spherical linear interpolation along the shortest path. The result is
/// normalized.
#[must_use]
pub fn slerp(q1: &glm::Quat, q2: &glm::Quat, t: f32) -> glm::Quat {
    let q1 = glm::quat_normalize(q1);
    let mut q2 = glm::quat_normalize(q2);
    let mut cos = q1.dot(&q2);
    if cos < 0.0 {
        q2 = -q2;
        cos = -cos;
    }
    if cos > 1.0 - SLERP_EPSILON {
        return glm::quat_normalize(&(q1 * (1.0 - t) + q2 * t));
    }
    let angle = cos.acos();
    let sin = angle.sin();
    let w1 = ((1.0 - t) * angle).sin() / sin;
    let w2 = (t * angle).sin() / sin;
    glm::quat_normalize(&(q1 * w1 + q2 * w2))
}

/// Catmull-Rom through `p1` and `p2`, with `p0` and `p3` as the neighbours
fn cubic_vec3(
    p0: &glm::Vec3,
    p1: &glm::Vec3,
    p2: &glm::Vec3,
    p3: &glm::Vec3,
    t: f32,
) -> glm::Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    let a = (p1 * 3.0 - p2 * 3.0 + p3 - p0) * 0.5;
    let b = (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * 0.5;
    let c = (p2 - p0) * 0.5;
    a * t3 + b * t2 + c * t + p1
}

/// The same curve applied to quaternion components. Neighbours are flipped
/// into the hemisphere of `q1` first and the result is normalized since the
/// blend leaves the unit sphere.
fn cubic_quat(
    q0: &glm::Quat,
    q1: &glm::Quat,
    q2: &glm::Quat,
    q3: &glm::Quat,
    t: f32,
) -> glm::Quat {
    let align = |q: &glm::Quat| if q1.dot(q) < 0.0 { -*q } else { *q };
    let (q0, q2) = (align(q0), align(q2));
    let q3 = if q2.dot(q3) < 0.0 { -*q3 } else { *q3 };
    let c = cubic_vec4(&q0.coords, &q1.coords, &q2.coords, &q3.coords, t);
    let q = glm::Quat::from(c);
    if q.norm() <= f32::EPSILON {
        // Degenerate blend, fall back to the plain arc
        return slerp(q1, &q2, t);
    }
    glm::quat_normalize(&q)
}

fn cubic_vec4(
    p0: &glm::Vec4,
    p1: &glm::Vec4,
    p2: &glm::Vec4,
    p3: &glm::Vec4,
    t: f32,
) -> glm::Vec4 {
    let t2 = t * t;
    let t3 = t2 * t;
    let a = (p1 * 3.0 - p2 * 3.0 + p3 - p0) * 0.5;
    let b = (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * 0.5;
    let c = (p2 - p0) * 0.5;
    a * t3 + b * t2 + c * t + p1
}

/// Blends two samples. Scale and translation are lerped, rotation is slerped.
#[must_use]
pub fn lerp_sqt(s1: &Sqt, s2: &Sqt, time: f64, f: f32) -> Sqt {
    Sqt {
        time,
        scale: glm::lerp(&s1.scale, &s2.scale, f),
        rotation: slerp(&s1.rotation, &s2.rotation, f),
        translation: glm::lerp(&s1.translation, &s2.translation, f),
    }
}

/// Nearest authored sample for a frame index. Indices past the end of the
/// track wrap using this track's own length.
#[must_use]
pub fn sample_frame(samples: &[Sqt], frame: usize) -> Option<Sqt> {
    if samples.is_empty() {
        return None;
    }
    Some(samples[frame % samples.len()])
}

/// Piecewise linear sample. Times outside the track return the first or last
/// sample unchanged.
#[must_use]
pub fn sample_linear(samples: &[Sqt], time: f64) -> Option<Sqt> {
    if samples.is_empty() {
        return None;
    }
    Some(match bracket(samples, time) {
        Bracket::Clamp(i) => samples[i],
        Bracket::Between(i, f) => {
            lerp_sqt(&samples[i], &samples[i + 1], time, f)
        }
    })
}

/// Four point cubic sample using the samples before and after the bracket.
/// Indices are clamped at the ends of the track and tracks with fewer than
/// four samples are sampled linearly.
#[must_use]
pub fn sample_cubic(samples: &[Sqt], time: f64) -> Option<Sqt> {
    if samples.len() < 4 {
        return sample_linear(samples, time);
    }
    Some(match bracket(samples, time) {
        Bracket::Clamp(i) => samples[i],
        Bracket::Between(i, f) => {
            let last = samples.len() - 1;
            let s0 = &samples[i.saturating_sub(1)];
            let s1 = &samples[i];
            let s2 = &samples[i + 1];
            let s3 = &samples[(i + 2).min(last)];
            Sqt {
                time,
                scale: cubic_vec3(&s0.scale, &s1.scale, &s2.scale, &s3.scale, f),
                rotation: cubic_quat(
                    &s0.rotation,
                    &s1.rotation,
                    &s2.rotation,
                    &s3.rotation,
                    f,
                ),
                translation: cubic_vec3(
                    &s0.translation,
                    &s1.translation,
                    &s2.translation,
                    &s3.translation,
                    f,
                ),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0005;

    fn approx_eq(a: f32, b: f32) {
        assert!((b - a).abs() < EPSILON, "{a} != {b}");
    }

    fn granary() -> Vec<Sqt> {
        (0..6)
            .map(|i| {
                let x = f64::from(i);
                #[allow(clippy::cast_possible_truncation)]
                let y = (x * x) as f32;
                Sqt {
                    translation: glm::vec3(0.0, y, 0.0),
                    rotation: glm::quat_angle_axis(
                        0.3 * y.sqrt(),
                        &glm::vec3(0.0, 0.0, 1.0),
                    ),
                    ..Sqt::identity(x)
                }
            })
            .collect()
    }

    #[test]
    fn weight() {
        let x = super::weight(0.0, 10.0, 7.0);
        approx_eq(x, 0.7);
        let x = super::weight(0.0, 10.0, 12.0);
        approx_eq(x, 1.0);
        let x = super::weight(0.0, 10.0, -2.0);
        approx_eq(x, 0.0);
        let x = super::weight(-2.0, 8.0, 3.0);
        approx_eq(x, 0.5);
        let x = super::weight(1.0, 1.0, 1.0);
        approx_eq(x, 0.0);
        let x = super::weight(3.0, 1.0, 2.0);
        approx_eq(x, 0.0);
    }

    /// Samples a tenth of a millisecond apart still blend by the real span
    #[test]
    fn close_samples() {
        let samples = [
            Sqt::identity(0.0),
            Sqt {
                translation: glm::vec3(0.0, 1.0, 0.0),
                ..Sqt::identity(0.0001)
            },
        ];
        approx_eq(super::weight(0.0, 0.0001, 0.000_05), 0.5);
        let s = sample_linear(&samples, 0.000_05).unwrap_or_default();
        approx_eq(s.translation.y, 0.5);
        let s = sample_linear(&samples, 0.000_075).unwrap_or_default();
        approx_eq(s.translation.y, 0.75);
    }

    #[test]
    fn bracket() {
        let samples = granary();
        assert_eq!(super::bracket(&samples, -1.0), Bracket::Clamp(0));
        assert_eq!(super::bracket(&samples, 0.0), Bracket::Clamp(0));
        assert_eq!(super::bracket(&samples, 9.0), Bracket::Clamp(5));
        assert_eq!(super::bracket(&samples, 2.25), Bracket::Between(2, 0.25));
        // Exactly on a sample picks it as the start of the window
        assert_eq!(super::bracket(&samples, 3.0), Bracket::Between(3, 0.0));
    }

    #[test]
    fn slerp_opposite_hemisphere() {
        let q1 = glm::quat_angle_axis(0.2, &glm::vec3(0.0, 1.0, 0.0));
        let q2 = -glm::quat_angle_axis(0.6, &glm::vec3(0.0, 1.0, 0.0));
        let mid = slerp(&q1, &q2, 0.5);
        let expected = glm::quat_angle_axis(0.4, &glm::vec3(0.0, 1.0, 0.0));
        assert!(mid.dot(&expected).abs() > 1.0 - EPSILON);
        approx_eq(mid.norm(), 1.0);
    }

    #[test]
    fn frame_wraps() {
        let samples = granary();
        assert_eq!(sample_frame(&samples, 2), Some(samples[2]));
        assert_eq!(sample_frame(&samples, 8), Some(samples[2]));
        assert_eq!(sample_frame(&[], 8), None);
    }

    #[test]
    fn cubic_hits_samples() {
        let samples = granary();
        for s in &samples {
            let c = sample_cubic(&samples, s.time).unwrap_or_default();
            approx_eq(c.translation.y, s.translation.y);
        }
        // Between samples the curve follows x^2 more closely than a line
        let c = sample_cubic(&samples, 2.5).unwrap_or_default();
        let l = sample_linear(&samples, 2.5).unwrap_or_default();
        assert!((c.translation.y - 6.25).abs() < (l.translation.y - 6.25).abs());
        approx_eq(c.rotation.norm(), 1.0);
    }

    #[test]
    fn cubic_short_track_is_linear() {
        let samples = &granary()[..3];
        let c = sample_cubic(samples, 1.5).unwrap_or_default();
        let l = sample_linear(samples, 1.5).unwrap_or_default();
        approx_eq(c.translation.y, l.translation.y);
        approx_eq(c.translation.y, 2.5);
    }
}
