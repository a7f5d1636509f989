//! Frame clock for the host loop.
//!
//! The installation never reads the wall clock itself; the host measures
//! each frame with a [`FrameClock`] and hands the elapsed seconds to
//! [`Installation::tick`](crate::Installation::tick).
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let dt = clock.update();
//!     installation.tick(dt);
//! }
//! ```

use std::time::{Duration, Instant};

/// Measures frame deltas and total running time.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    suspended: bool,
    suspended_for: Duration,
    fixed_delta: Option<f32>,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            suspended: false,
            suspended_for: Duration::ZERO,
            fixed_delta: None,
        }
    }

    /// Start a new frame and return its delta in seconds.
    ///
    /// While suspended the delta is 0 and elapsed time holds still.
    pub fn update(&mut self) -> f32 {
        if self.suspended {
            self.delta_secs = 0.0;
            return 0.0;
        }

        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;
        self.elapsed_secs = (now.duration_since(self.start) - self.suspended_for).as_secs_f32();
        self.frame_count += 1;

        let since_fps = now.duration_since(self.fps_update_time);
        if since_fps >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since_fps.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.delta_secs
    }

    /// Seconds since start, excluding time spent suspended.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// The window went to the background.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Back in the foreground. The time away is not counted as a frame.
    pub fn resume(&mut self) {
        if self.suspended {
            let now = Instant::now();
            self.suspended_for += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.suspended = false;
        }
    }

    /// Report the same delta every frame regardless of wall time.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
