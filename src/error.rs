//! Error types for glimmer.
//!
//! Only two things can fail: loading/validating the installation
//! configuration, and bringing up the camera or hand detector. Per-frame
//! anomalies (no hand in view, a repeated video frame, coincident landmarks)
//! are ordinary outcomes and never surface as errors.

use thiserror::Error;

/// Errors raised while loading or validating an [`InstallationConfig`](crate::InstallationConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration file is not valid JSON for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is outside its permitted range.
    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field, e.g. `tree.radius`.
        field: &'static str,
        /// Human-readable explanation.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Terminal failures of the gesture subsystem.
///
/// Either one moves the status to `Camera Error`, forces the freeze flag off
/// and halts the detection cycle. Neither is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// Camera permission denied or no capture device available.
    #[error("camera unavailable: {0}")]
    Acquisition(String),
    /// The hand detection capability failed to load.
    #[error("hand detector failed to initialize: {0}")]
    DetectionInit(String),
}

/// Errors that stop the host binary from running.
#[derive(Debug, Error)]
pub enum RunError {
    /// Bad command-line arguments.
    #[error("{0}")]
    Usage(String),
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Failed to create the event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
}
