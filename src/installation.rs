//! The per-frame scheduler tying everything together.
//!
//! An [`Installation`] is built once from a validated configuration and a
//! vision backend, then driven by the host loop calling
//! [`tick`](Installation::tick) with the seconds elapsed since the last
//! frame. Each tick runs, in order:
//!
//! 1. acquisition: startup progress, or detection on a new video frame
//!    followed by classification
//! 2. the explosion smoother, chasing the gesture's target
//! 3. the snow fall, skipped while frozen
//! 4. uniforms and rigid transforms for the renderer
//!
//! Dropping the installation, or calling [`stop`](Installation::stop),
//! cancels pending startup work and releases the camera and detector.

use crate::burst::{SceneTransforms, TreeUniforms};
use crate::config::{ExplosionSource, InstallationConfig};
use crate::detection::{Acquisition, AcquisitionState, CaptureRequest, DetectorOptions, VisionBackend};
use crate::error::ConfigError;
use crate::generator::SceneBuffers;
use crate::gesture::{Classification, GestureClassifier, GestureState, Status};
use crate::palette::Palette;
use crate::smoothing::SmoothedParameter;
use crate::spawn::Sampler;
use tracing::{debug, info};

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSnapshot {
    pub frame: u64,
    /// Seconds since the installation started ticking.
    pub time: f32,
    pub state: GestureState,
    pub status: Status,
    /// Set when a new video frame was classified this tick.
    pub classification: Option<Classification>,
    /// Smoothed burst amount in `[0, 1]`.
    pub explosion: f32,
    /// Whether the snow position buffer changed and needs re-uploading.
    pub snow_moved: bool,
    pub uniforms: TreeUniforms,
    pub transforms: SceneTransforms,
}

impl FrameSnapshot {
    #[inline]
    pub fn frozen(&self) -> bool {
        self.state.is_frozen()
    }
}

pub struct Installation {
    config: InstallationConfig,
    palette: Palette,
    scene: SceneBuffers,
    classifier: GestureClassifier,
    acquisition: Acquisition,
    explosion: SmoothedParameter,
    time: f32,
    frame: u64,
}

impl Installation {
    /// Validate `config`, generate the scene and prepare acquisition.
    ///
    /// Nothing is acquired until [`start`](Self::start).
    pub fn new(config: InstallationConfig, backend: Box<dyn VisionBackend>) -> Result<Self, ConfigError> {
        Self::with_requests(config, backend, CaptureRequest::default(), DetectorOptions::default())
    }

    pub fn with_requests(
        config: InstallationConfig,
        backend: Box<dyn VisionBackend>,
        capture: CaptureRequest,
        options: DetectorOptions,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let palette = Palette::from_config(&config.palette)?;
        let mut sampler = Sampler::new(config.seed);
        let scene = SceneBuffers::generate(&config, &palette, &mut sampler);

        info!(
            particles = config.total_particles(),
            seed = ?config.seed,
            explosion = ?config.explosion,
            "installation ready"
        );

        Ok(Self {
            classifier: GestureClassifier::new(&config.gesture),
            acquisition: Acquisition::with_requests(backend, capture, options),
            explosion: SmoothedParameter::unit(&config.smoothing),
            config,
            palette,
            scene,
            time: 0.0,
            frame: 0,
        })
    }

    /// Begin bringing up the detector and camera.
    pub fn start(&mut self) {
        self.acquisition.start();
    }

    /// Advance one frame.
    pub fn tick(&mut self, elapsed: f32) -> FrameSnapshot {
        let dt = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        self.time += dt;
        self.frame += 1;

        let classification = self.acquisition.tick(dt, &mut self.classifier);
        let state = self.classifier.state();

        let target = match self.config.explosion {
            ExplosionSource::Gesture => state.target(),
            ExplosionSource::Fixed(value) => value,
        };
        let explosion = self.explosion.update(target, dt);

        let snow_moved = self.scene.snow.update(state.is_frozen());

        if let Some(c) = &classification {
            debug!(
                frame = self.frame,
                openness = ?c.openness,
                explosion,
                "frame classified"
            );
        }

        FrameSnapshot {
            frame: self.frame,
            time: self.time,
            state,
            status: self.classifier.status(),
            classification,
            explosion,
            snow_moved,
            uniforms: TreeUniforms::new(self.time, self.config.tree.height, explosion),
            transforms: SceneTransforms::at(self.time, self.star_height()),
        }
    }

    /// Release the camera and detector and let time flow again. The scene
    /// stays readable and keeps ticking.
    pub fn stop(&mut self) {
        self.acquisition.stop();
        self.classifier.release();
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &InstallationConfig {
        &self.config
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn scene(&self) -> &SceneBuffers {
        &self.scene
    }

    pub fn state(&self) -> GestureState {
        self.classifier.state()
    }

    pub fn status(&self) -> Status {
        self.classifier.status()
    }

    pub fn explosion(&self) -> f32 {
        self.explosion.current()
    }

    pub fn acquisition_state(&self) -> AcquisitionState {
        self.acquisition.state()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// World-space height of the star group.
    pub fn star_height(&self) -> f32 {
        self.config.tree.height + self.config.star.height_above_tree
    }
}

impl std::fmt::Debug for Installation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installation")
            .field("frame", &self.frame)
            .field("state", &self.state())
            .field("status", &self.status())
            .field("explosion", &self.explosion())
            .field("acquisition", &self.acquisition)
            .finish_non_exhaustive()
    }
}
