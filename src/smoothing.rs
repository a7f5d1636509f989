//! Frame-rate independent parameter smoothing.
//!
//! A [`SmoothedParameter`] chases a target with an exponential approach:
//!
//! ```text
//! current += (target - current) * min(1, elapsed * rate)
//! ```
//!
//! The blend factor is clamped so a long frame (a window restored after
//! minutes in the background) lands exactly on the target instead of
//! overshooting past it.

use crate::config::SmoothingConfig;

/// Default responsiveness, per second.
pub const DEFAULT_RATE: f32 = 3.0;

/// One animated scalar with a bounded range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedParameter {
    current: f32,
    rate: f32,
    min: f32,
    max: f32,
}

impl SmoothedParameter {
    /// Create a parameter starting at `initial` with the given rate.
    pub fn new(initial: f32, rate: f32) -> Self {
        Self {
            current: initial,
            rate,
            min: f32::NEG_INFINITY,
            max: f32::INFINITY,
        }
    }

    /// A `[0, 1]` parameter starting at 0, as used for the explosion amount.
    pub fn unit(config: &SmoothingConfig) -> Self {
        Self::new(0.0, config.rate).with_range(0.0, 1.0)
    }

    /// Bound the parameter. Targets outside the range are clamped.
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self.current = self.current.clamp(min, max);
        self
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Advance one frame toward `target` and return the new value.
    ///
    /// Negative or non-finite `elapsed` counts as no time passing.
    pub fn update(&mut self, target: f32, elapsed: f32) -> f32 {
        let target = target.clamp(self.min, self.max);
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        let blend = (elapsed * self.rate).min(1.0);
        if blend >= 1.0 {
            self.current = target;
        } else {
            self.current += (target - self.current) * blend;
        }
        self.current
    }

    /// Re-enter at a known value, e.g. after the scene was rebuilt.
    pub fn resume_from(&mut self, current: f32) {
        self.current = current.clamp(self.min, self.max);
    }
}

impl Default for SmoothedParameter {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_RATE)
    }
}
