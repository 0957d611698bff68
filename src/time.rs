//! Frame clock and frame-rate pacing.
//!
//! Both types take the current [`Instant`] as an argument instead of reading
//! the system clock, so the render loop decides what "now" is and tests can
//! drive them with synthetic instants.
//!
//! # Example
//!
//! ```ignore
//! use chromatic_vortex::time::{FrameClock, FramePacer};
//!
//! let start = Instant::now();
//! let mut clock = FrameClock::new(start);
//! let mut pacer = FramePacer::new(60);
//!
//! // In the event loop:
//! let now = Instant::now();
//! if pacer.ready(now) {
//!     let time = clock.tick(now);
//!     // draw with `time`
//! }
//! ```

use std::time::{Duration, Instant};

/// Default frame-rate cap.
pub const TARGET_FPS: u32 = 60;

/// Interval over which the FPS figure is averaged.
const FPS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Elapsed-time clock for the animation.
///
/// Elapsed time is derived from `Instant` differences rather than summed
/// per-frame deltas, so it does not drift over long sessions. It never
/// decreases, including across pauses.
#[derive(Debug, Clone)]
pub struct FrameClock {
    /// When the clock was (re)started.
    start: Instant,
    /// Total time spent paused.
    paused_total: Duration,
    /// Set while paused, to the instant the pause began.
    paused_at: Option<Instant>,
    /// Last reported elapsed time.
    elapsed: Duration,
    /// Frames ticked since start.
    frame_count: u64,
    /// Averaged frames per second.
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
}

impl FrameClock {
    /// Start a clock at zero.
    pub fn new(now: Instant) -> Self {
        Self {
            start: now,
            paused_total: Duration::ZERO,
            paused_at: None,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
        }
    }

    /// Advance to `now` and return the elapsed seconds.
    ///
    /// Counts one frame. While paused the returned time stays put.
    pub fn tick(&mut self, now: Instant) -> f32 {
        if self.paused_at.is_none() {
            let raw = now
                .saturating_duration_since(self.start)
                .saturating_sub(self.paused_total);
            self.elapsed = self.elapsed.max(raw);
        }

        self.frame_count += 1;

        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= FPS_UPDATE_INTERVAL {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.elapsed_secs()
    }

    /// Last reported elapsed time in seconds.
    #[inline]
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Last reported elapsed time.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Frames ticked since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second averaged over the last half second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Freeze the clock.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Resume after [`pause`](Self::pause); time continues from where it froze.
    pub fn resume(&mut self, now: Instant) {
        if let Some(at) = self.paused_at.take() {
            self.paused_total += now.saturating_duration_since(at);
        }
    }

    pub fn toggle_pause(&mut self, now: Instant) {
        if self.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Restart from zero, keeping the pause state.
    pub fn restart(&mut self, now: Instant) {
        let paused = self.is_paused();
        *self = Self::new(now);
        if paused {
            self.paused_at = Some(now);
        }
    }
}

/// Caps the draw rate to a target frame interval.
///
/// A frame is drawn only once at least one interval has passed since the
/// last drawn frame. The overshoot is carried forward so the average rate
/// stays on target instead of drifting below it.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    last: Option<Instant>,
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(TARGET_FPS)
    }
}

impl FramePacer {
    /// Pacer for `fps` frames per second. Zero is treated as one.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            last: None,
        }
    }

    /// The target frame interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a frame should be drawn at `now`. Records it if so.
    pub fn ready(&mut self, now: Instant) -> bool {
        let Some(last) = self.last else {
            self.last = Some(now);
            return true;
        };

        let delta = now.saturating_duration_since(last);
        if delta < self.interval {
            return false;
        }

        let remainder = delta.as_nanos() % self.interval.as_nanos();
        self.last = Some(now - Duration::from_nanos(remainder as u64));
        true
    }

    /// Earliest instant at which [`ready`](Self::ready) can return `true`.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.last.map(|last| last + self.interval)
    }

    /// Forget the last drawn frame; the next call to `ready` draws.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
