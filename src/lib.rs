//! # Glimmer
//!
//! Control and data-generation core of an interactive particle installation:
//! a glowing tree of points with rings, a star and falling snow, where an
//! open hand held up to the camera stops time.
//!
//! Rendering is someone else's job. Glimmer produces the static particle
//! buffers once, then every frame hands back a small [`FrameSnapshot`]: the
//! freeze flag, a smoothed burst amount and the uniforms the renderer needs.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glimmer::prelude::*;
//!
//! let backend = SimulatedBackend::new();
//! let hand = backend.handle();
//! let mut installation = Installation::new(InstallationConfig::default(), Box::new(backend))?;
//! installation.start();
//!
//! hand.set_pose(HandPose::Open);
//! let mut clock = FrameClock::new();
//! loop {
//!     hand.advance(clock.delta());
//!     let frame = installation.tick(clock.update());
//!     if frame.snow_moved {
//!         upload(frame, installation.scene().snow.population());
//!     }
//! }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module |
//! |-------|--------|
//! | Camera and detector lifecycle | [`detection`] |
//! | Openness of a hand | [`landmarks`] |
//! | Frozen/flowing signal, status line | [`gesture`] |
//! | Burst amount | [`smoothing`] |
//! | Particle layout | [`generator`], [`snow`] |
//! | Per-frame animation reference | [`burst`] |
//!
//! All of it runs on one thread. Startup futures are polled from
//! [`Installation::tick`] and never block the frame.

pub mod burst;
pub mod config;
pub mod detection;
pub mod error;
pub mod generator;
pub mod gesture;
pub mod input;
mod installation;
pub mod landmarks;
pub mod palette;
pub mod population;
pub mod sim;
pub mod smoothing;
pub mod snow;
pub mod spawn;
pub mod time;

pub use config::{ExplosionSource, InstallationConfig};
pub use error::{AcquisitionError, ConfigError, RunError};
pub use installation::{FrameSnapshot, Installation};

/// Re-exports for hosts and tests.
///
/// ```ignore
/// use glimmer::prelude::*;
/// ```
pub mod prelude {
    pub use crate::burst::{SceneTransforms, TreeUniforms};
    pub use crate::config::{ExplosionSource, InstallationConfig};
    pub use crate::detection::{
        Acquisition, AcquisitionState, CaptureDevice, CaptureRequest, Detection, DetectorOptions,
        HandDetector, VideoFrame, VisionBackend,
    };
    pub use crate::error::{AcquisitionError, ConfigError};
    pub use crate::generator::SceneBuffers;
    pub use crate::gesture::{GestureClassifier, GestureState, Indicator, Status};
    pub use crate::installation::{FrameSnapshot, Installation};
    pub use crate::landmarks::{openness, Finger, LandmarkSet};
    pub use crate::population::{Attribute, ParticlePopulation, PopulationKind};
    pub use crate::sim::{synthetic_hand, HandPose, SimHandle, SimulatedBackend};
    pub use crate::smoothing::SmoothedParameter;
    pub use crate::spawn::Sampler;
    pub use crate::time::FrameClock;
    pub use glam::Vec3;
}
