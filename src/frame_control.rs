use log::trace;
use std::time::{Duration, Instant};

/// Timing of the most recent frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TimeData {
    /// Seconds since the previous frame
    pub delta_time: f64,
    /// Frames per second derived from `delta_time`, 0 when it is 0
    pub fps: f32,
}

/// Measures the wall clock between frames
#[derive(Clone, Debug, Default)]
pub struct FrameTimer {
    previous: Option<Instant>,
    data: TimeData,
    frame_count: usize,
}

impl FrameTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new frame using the wall clock. The first frame has a delta
    /// of 0.
    pub fn tick(&mut self) -> TimeData {
        let now = Instant::now();
        let delta = self
            .previous
            .map_or(Duration::ZERO, |previous| now - previous);
        self.previous = Some(now);
        self.advance(delta)
    }

    /// Starts a new frame with a known delta
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self, delta: Duration) -> TimeData {
        let delta_time = delta.as_secs_f64();
        let fps = if delta_time > 0.0 {
            (1.0 / delta_time) as f32
        } else {
            0.0
        };
        self.data = TimeData { delta_time, fps };
        self.frame_count += 1;
        trace!(
            "frame_count={} delta_time={} fps={}",
            self.frame_count,
            delta_time,
            fps
        );
        self.data
    }

    #[must_use]
    pub const fn data(&self) -> TimeData {
        self.data
    }

    #[must_use]
    pub const fn frame_count(&self) -> usize {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_from_delta() {
        let mut timer = FrameTimer::new();
        let data = timer.advance(Duration::from_millis(20));
        assert!((data.delta_time - 0.02).abs() < 1.0e-9);
        assert!((data.fps - 50.0).abs() < 0.001);
        let data = timer.advance(Duration::ZERO);
        assert!(data.fps.abs() < f32::EPSILON);
        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.data(), data);
    }

    #[test]
    fn first_tick_is_zero() {
        let mut timer = FrameTimer::new();
        let data = timer.tick();
        assert!(data.delta_time.abs() < f64::EPSILON);
        assert!(timer.tick().delta_time >= 0.0);
    }
}
