//! Open-hand classification and frame debouncing.
//!
//! The classifier is the single writer of the installation's shared signal:
//! a frozen/flowing flag plus the status line shown to visitors. Every frame
//! that carries a detection result re-emits the flag, even when it has not
//! changed, so consumers must treat it as a level rather than an edge.

use crate::config::GestureConfig;
use crate::landmarks::LandmarkSet;
use std::fmt;
use tracing::{info, trace};

/// Whether the snow is held still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Flowing,
    Frozen,
}

impl GestureState {
    #[inline]
    pub fn is_frozen(self) -> bool {
        self == GestureState::Frozen
    }

    /// Target for a smoothed parameter: 1 while frozen, 0 otherwise.
    #[inline]
    pub fn target(self) -> f32 {
        if self.is_frozen() {
            1.0
        } else {
            0.0
        }
    }
}

/// Status line for display. Has no behavioral effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Camera and detector are still coming up.
    #[default]
    Initializing,
    /// First video data arrived; detection is running.
    Active,
    /// Open hand in view.
    FreezingTime,
    /// Hand in view but not open.
    Flowing,
    NoHandDetected,
    /// Camera or detector failed to start. Terminal.
    CameraError,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Initializing => "Initializing",
            Status::Active => "Active",
            Status::FreezingTime => "Freezing Time",
            Status::Flowing => "Flowing",
            Status::NoHandDetected => "No Hand Detected",
            Status::CameraError => "Camera Error",
        }
    }

    /// Badge shown next to the camera preview.
    pub fn indicator(self) -> Indicator {
        if self == Status::FreezingTime {
            Indicator::Paused
        } else {
            Indicator::Live
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Live,
    Paused,
}

impl Indicator {
    pub fn label(self) -> &'static str {
        match self {
            Indicator::Live => "LIVE",
            Indicator::Paused => "PAUSED",
        }
    }
}

/// Result of classifying one video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub state: GestureState,
    pub status: Status,
    /// Openness of the detected hand, `None` when no hand was found.
    pub openness: Option<f32>,
    /// Detector confidence, when the detector reports one.
    pub confidence: Option<f32>,
}

/// Turns per-frame hand detections into the frozen/flowing signal.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    threshold: f32,
    epsilon: f32,
    last_timestamp: Option<f64>,
    state: GestureState,
    status: Status,
}

impl GestureClassifier {
    pub fn new(config: &GestureConfig) -> Self {
        Self {
            threshold: config.open_threshold,
            epsilon: config.epsilon,
            last_timestamp: None,
            state: GestureState::Flowing,
            status: Status::Initializing,
        }
    }

    #[inline]
    pub fn state(&self) -> GestureState {
        self.state
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Open-hand test. Inclusive: exactly at the threshold is open.
    pub fn classify(&self, openness: Option<f32>) -> GestureState {
        match openness {
            Some(value) if value >= self.threshold => GestureState::Frozen,
            _ => GestureState::Flowing,
        }
    }

    /// Record `timestamp` as processed; `false` if it was already the last one.
    ///
    /// Video elements report the same time until a new frame is decoded, so
    /// a display refresh that outpaces the camera sees repeats.
    pub fn accept_frame(&mut self, timestamp: f64) -> bool {
        if self.last_timestamp == Some(timestamp) {
            trace!(timestamp, "video frame unchanged, skipping");
            return false;
        }
        self.last_timestamp = Some(timestamp);
        true
    }

    /// Classify one detection result and publish it.
    pub fn observe(&mut self, hand: Option<&LandmarkSet>, confidence: Option<f32>) -> Classification {
        let openness = hand.map(|h| h.openness(self.epsilon));
        let state = self.classify(openness);
        let status = match (openness, state) {
            (None, _) => Status::NoHandDetected,
            (Some(_), GestureState::Frozen) => Status::FreezingTime,
            (Some(_), GestureState::Flowing) => Status::Flowing,
        };
        self.publish(state, status);
        Classification {
            state,
            status,
            openness,
            confidence,
        }
    }

    /// Lifecycle status from the acquisition loop (initializing, active).
    pub fn report(&mut self, status: Status) {
        if self.status != status {
            info!(from = %self.status, to = %status, "gesture status");
        }
        self.status = status;
    }

    /// Terminal failure: release the freeze and show the error.
    pub fn fail(&mut self) {
        self.publish(GestureState::Flowing, Status::CameraError);
    }

    /// Acquisition ended: drop any freeze. A `Camera Error` status is kept.
    pub fn release(&mut self) {
        let status = match self.status {
            Status::CameraError => Status::CameraError,
            _ => Status::Flowing,
        };
        self.publish(GestureState::Flowing, status);
    }

    /// Forget the last processed timestamp and fall back to flowing.
    pub fn reset(&mut self) {
        self.last_timestamp = None;
        self.state = GestureState::Flowing;
        self.status = Status::Initializing;
    }

    fn publish(&mut self, state: GestureState, status: Status) {
        if self.state != state {
            info!(?state, "gesture state changed");
        } else {
            trace!(?state, "gesture state unchanged");
        }
        self.state = state;
        self.report(status);
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(&GestureConfig::default())
    }
}
