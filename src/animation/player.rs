use log::{debug, trace};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PlayState {
    #[default]
    Playing,
    Paused,
}

/// Playback cursor for one clip of one asset. The player refers to its
/// target by index so it never borrows the asset list it drives.
#[derive(Clone, Debug, Default)]
pub struct AnimationPlayer {
    target: usize,
    clip: usize,
    duration: f64,
    time: f64,
    frame: usize,
    state: PlayState,
}

impl AnimationPlayer {
    /// Creates a player in the `Playing` state at time 0
    #[must_use]
    pub const fn new(target: usize, clip: usize, duration: f64) -> Self {
        Self {
            target,
            clip,
            duration,
            time: 0.0,
            frame: 0,
            state: PlayState::Playing,
        }
    }

    /// Moves playback forward by `delta_time * speed` seconds and returns the
    /// new time. Crossing the end of the clip snaps back to 0 rather than
    /// wrapping by the overshoot. Paused players don't move.
    pub fn advance(&mut self, delta_time: f64, speed: f64) -> f64 {
        if self.state == PlayState::Paused {
            return self.time;
        }
        let new_time = delta_time.mul_add(speed, self.time);
        if new_time > self.duration || new_time < 0.0 {
            trace!("time {} outside 0..{}, restarting", new_time, self.duration);
            self.time = 0.0;
        } else {
            self.time = new_time;
        }
        self.time
    }

    /// Sets the time to 0 whether playing or not
    pub fn reset(&mut self) {
        self.time = 0.0;
    }

    /// Switches to another target and clip, starting again from the top
    pub fn retarget(&mut self, target: usize, clip: usize, duration: f64) {
        debug!(
            "retarget to asset {} clip {} duration {}",
            target, clip, duration
        );
        self.target = target;
        self.clip = clip;
        self.duration = duration;
        self.time = 0.0;
        self.frame = 0;
    }

    pub fn toggle_play(&mut self) {
        self.state = match self.state {
            PlayState::Playing => PlayState::Paused,
            PlayState::Paused => PlayState::Playing,
        };
    }

    pub fn play(&mut self) {
        self.state = PlayState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = PlayState::Paused;
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == PlayState::Playing
    }

    #[must_use]
    pub const fn state(&self) -> PlayState {
        self.state
    }

    /// Current time in seconds
    #[must_use]
    pub const fn time(&self) -> f64 {
        self.time
    }

    #[must_use]
    pub const fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub const fn target(&self) -> usize {
        self.target
    }

    #[must_use]
    pub const fn clip(&self) -> usize {
        self.clip
    }

    /// Frame cursor used for discrete sampling
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frame
    }

    /// Steps the frame cursor forward, wrapping at `frame_count`
    pub fn next_frame(&mut self, frame_count: usize) -> usize {
        self.frame = if frame_count == 0 {
            0
        } else {
            (self.frame + 1) % frame_count
        };
        self.frame
    }

    /// Steps the frame cursor back, wrapping to the last frame
    pub fn previous_frame(&mut self, frame_count: usize) -> usize {
        self.frame = match (frame_count, self.frame) {
            (0, _) => 0,
            (n, 0) => n - 1,
            (n, f) => (f - 1).min(n - 1),
        };
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) {
        assert!((b - a).abs() < 1.0e-9, "{a} != {b}");
    }

    #[test]
    fn restarts_past_end() {
        let mut player = AnimationPlayer::new(0, 0, 2.0);
        approx_eq(player.advance(1.5, 1.0), 1.5);
        // 2.5 is past the end so the player snaps to 0 instead of 0.5
        approx_eq(player.advance(1.0, 1.0), 0.0);
        approx_eq(player.advance(0.25, 2.0), 0.5);
    }

    #[test]
    fn paused_does_not_move() {
        let mut player = AnimationPlayer::new(0, 0, 2.0);
        player.advance(0.5, 1.0);
        player.toggle_play();
        assert_eq!(player.state(), PlayState::Paused);
        approx_eq(player.advance(0.5, 1.0), 0.5);
        approx_eq(player.advance(0.5, 1.0), 0.5);
        player.toggle_play();
        assert!(player.is_playing());
        approx_eq(player.advance(0.5, 1.0), 1.0);
    }

    #[test]
    fn reset_while_paused() {
        let mut player = AnimationPlayer::new(0, 0, 2.0);
        player.advance(1.0, 1.0);
        player.pause();
        player.reset();
        approx_eq(player.time(), 0.0);
        assert!(!player.is_playing());
    }

    #[test]
    fn retarget_restarts() {
        let mut player = AnimationPlayer::new(0, 0, 2.0);
        player.advance(1.0, 1.0);
        player.next_frame(10);
        player.retarget(2, 1, 4.0);
        assert_eq!((player.target(), player.clip()), (2, 1));
        approx_eq(player.time(), 0.0);
        assert_eq!(player.frame_index(), 0);
        approx_eq(player.advance(3.0, 1.0), 3.0);
    }

    #[test]
    fn frame_cursor_wraps() {
        let mut player = AnimationPlayer::default();
        assert_eq!(player.previous_frame(3), 2);
        assert_eq!(player.next_frame(3), 0);
        assert_eq!(player.next_frame(3), 1);
        assert_eq!(player.next_frame(0), 0);
        assert_eq!(player.previous_frame(0), 0);
    }
}
