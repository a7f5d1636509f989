//! Camera and hand-detector lifecycle.
//!
//! [`Acquisition`] owns both resources and turns their asynchronous startup
//! into something a frame loop can drive: each [`Acquisition::tick`] polls
//! whatever is pending exactly once and never blocks. Startup order is
//! detector first, then camera; the first decoded video frame switches the
//! status to `Active` and starts the per-frame detection cycle.
//!
//! ```text
//! Idle ─start─▶ LoadingDetector ─▶ OpeningCamera ─▶ WaitingForData ─▶ Running
//!                     │                  │                                │
//!                     └──── error ───────┴──▶ Failed          stop ──▶ Stopped
//! ```
//!
//! Failures are terminal. Nothing is retried; the classifier is told to
//! fail so the freeze flag drops and the status reads `Camera Error`.

use crate::error::AcquisitionError;
use crate::gesture::{Classification, GestureClassifier, Status};
use crate::landmarks::LandmarkSet;
use futures::future::LocalBoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;
use std::fmt;
use std::mem;
use std::task::{Context, Poll};
use tracing::{debug, error, info, warn};

/// Hosted hand-landmarker model.
pub const DEFAULT_MODEL_ASSET: &str = "https://storage.googleapis.com/mediapipe-models/hand_landmarker/hand_landmarker/float16/1/hand_landmarker.task";

/// Smallest step between two detector timestamps, in milliseconds.
const MIN_STAMP_STEP_MS: f64 = 1.0;

// ========== Capability requests ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

/// What to ask the camera for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            facing: FacingMode::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunningMode {
    Image,
    #[default]
    Video,
}

/// How to configure the hand detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorOptions {
    pub model_asset: String,
    pub num_hands: usize,
    pub running_mode: RunningMode,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            model_asset: DEFAULT_MODEL_ASSET.to_string(),
            num_hands: 1,
            running_mode: RunningMode::Video,
        }
    }
}

// ========== Capabilities ==========

/// The most recent decoded video frame.
///
/// `timestamp` is the video's own clock in seconds and repeats until the
/// next frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoFrame {
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
}

/// Zero or one hands found in a frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Detection {
    pub hand: Option<LandmarkSet>,
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn hand(hand: LandmarkSet, confidence: Option<f32>) -> Self {
        Self {
            hand: Some(hand),
            confidence,
        }
    }
}

/// A live video source.
pub trait CaptureDevice {
    /// Current frame, or `None` until the first frame has been decoded.
    fn latest_frame(&mut self) -> Option<VideoFrame>;

    /// Stop every capture track. Must be idempotent.
    fn stop(&mut self);
}

/// Hand-landmark detection on single video frames.
pub trait HandDetector {
    /// Detect synchronously. `timestamp_ms` must increase between calls.
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Detection;

    /// Release model resources. Must be idempotent.
    fn close(&mut self);
}

pub type DetectorFuture = LocalBoxFuture<'static, Result<Box<dyn HandDetector>, AcquisitionError>>;
pub type CameraFuture = LocalBoxFuture<'static, Result<Box<dyn CaptureDevice>, AcquisitionError>>;

/// Platform glue that can produce a detector and a camera.
///
/// Both operations are asynchronous and may fail. The returned futures are
/// polled from the frame loop with a no-op waker, so they must make progress
/// when polled rather than relying on wake-ups.
pub trait VisionBackend {
    fn load_detector(&mut self, options: &DetectorOptions) -> DetectorFuture;
    fn open_camera(&mut self, request: &CaptureRequest) -> CameraFuture;
}

// ========== Acquisition loop ==========

/// Observable phase of an [`Acquisition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    LoadingDetector,
    OpeningCamera,
    WaitingForData,
    Running,
    Failed,
    Stopped,
}

enum Phase {
    Idle,
    LoadingDetector(DetectorFuture),
    OpeningCamera {
        detector: Box<dyn HandDetector>,
        camera: CameraFuture,
    },
    WaitingForData {
        detector: Box<dyn HandDetector>,
        camera: Box<dyn CaptureDevice>,
    },
    Running {
        detector: Box<dyn HandDetector>,
        camera: Box<dyn CaptureDevice>,
    },
    Failed(AcquisitionError),
    Stopped,
}

impl Phase {
    fn state(&self) -> AcquisitionState {
        match self {
            Phase::Idle => AcquisitionState::Idle,
            Phase::LoadingDetector(_) => AcquisitionState::LoadingDetector,
            Phase::OpeningCamera { .. } => AcquisitionState::OpeningCamera,
            Phase::WaitingForData { .. } => AcquisitionState::WaitingForData,
            Phase::Running { .. } => AcquisitionState::Running,
            Phase::Failed(_) => AcquisitionState::Failed,
            Phase::Stopped => AcquisitionState::Stopped,
        }
    }
}

/// Owns the camera and detector and runs one detection per new video frame.
pub struct Acquisition {
    backend: Box<dyn VisionBackend>,
    capture: CaptureRequest,
    options: DetectorOptions,
    phase: Phase,
    clock_ms: f64,
    last_stamp_ms: Option<f64>,
}

impl Acquisition {
    pub fn new(backend: Box<dyn VisionBackend>) -> Self {
        Self::with_requests(backend, CaptureRequest::default(), DetectorOptions::default())
    }

    pub fn with_requests(
        backend: Box<dyn VisionBackend>,
        capture: CaptureRequest,
        options: DetectorOptions,
    ) -> Self {
        Self {
            backend,
            capture,
            options,
            phase: Phase::Idle,
            clock_ms: 0.0,
            last_stamp_ms: None,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.phase.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == AcquisitionState::Running
    }

    /// The failure that halted the cycle, if any.
    pub fn error(&self) -> Option<&AcquisitionError> {
        match &self.phase {
            Phase::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Begin loading the detector. Only valid from `Idle`.
    pub fn start(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            warn!(state = ?self.state(), "acquisition already started");
            return;
        }
        info!(
            model = %self.options.model_asset,
            hands = self.options.num_hands,
            "loading hand detector"
        );
        self.phase = Phase::LoadingDetector(self.backend.load_detector(&self.options));
    }

    /// Advance startup and run at most one detection.
    ///
    /// Returns the classification when a new video frame was processed this
    /// tick, `None` otherwise.
    pub fn tick(&mut self, elapsed: f32, classifier: &mut GestureClassifier) -> Option<Classification> {
        if elapsed.is_finite() && elapsed > 0.0 {
            self.clock_ms += f64::from(elapsed) * 1000.0;
        }

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut result = None;
        loop {
            let (next, progressed) = match mem::replace(&mut self.phase, Phase::Stopped) {
                Phase::LoadingDetector(mut pending) => match pending.poll_unpin(&mut cx) {
                    Poll::Pending => (Phase::LoadingDetector(pending), false),
                    Poll::Ready(Ok(detector)) => {
                        info!(
                            width = self.capture.width,
                            height = self.capture.height,
                            facing = ?self.capture.facing,
                            "hand detector ready, opening camera"
                        );
                        let camera = self.backend.open_camera(&self.capture);
                        (Phase::OpeningCamera { detector, camera }, true)
                    }
                    Poll::Ready(Err(e)) => (Self::failed(e, classifier), false),
                },
                Phase::OpeningCamera {
                    mut detector,
                    camera: mut pending,
                } => match pending.poll_unpin(&mut cx) {
                    Poll::Pending => (
                        Phase::OpeningCamera {
                            detector,
                            camera: pending,
                        },
                        false,
                    ),
                    Poll::Ready(Ok(camera)) => {
                        debug!("camera open, waiting for first frame");
                        (Phase::WaitingForData { detector, camera }, true)
                    }
                    Poll::Ready(Err(e)) => {
                        detector.close();
                        (Self::failed(e, classifier), false)
                    }
                },
                Phase::WaitingForData {
                    detector,
                    mut camera,
                } => {
                    if camera.latest_frame().is_some() {
                        info!("video data loaded, detection running");
                        classifier.report(Status::Active);
                        (Phase::Running { detector, camera }, true)
                    } else {
                        (Phase::WaitingForData { detector, camera }, false)
                    }
                }
                Phase::Running {
                    mut detector,
                    mut camera,
                } => {
                    result = camera.latest_frame().and_then(|frame| {
                        if !classifier.accept_frame(frame.timestamp) {
                            return None;
                        }
                        let detection = detector.detect(&frame, self.next_stamp());
                        Some(classifier.observe(detection.hand.as_ref(), detection.confidence))
                    });
                    (Phase::Running { detector, camera }, false)
                }
                idle @ (Phase::Idle | Phase::Failed(_) | Phase::Stopped) => (idle, false),
            };
            self.phase = next;
            if !progressed {
                return result;
            }
        }
    }

    /// Cancel whatever is pending and release the detector and camera.
    ///
    /// Safe in every phase, including before `start` and after a failure.
    pub fn stop(&mut self) {
        match mem::replace(&mut self.phase, Phase::Stopped) {
            Phase::Stopped => return,
            Phase::Idle | Phase::Failed(_) => {}
            Phase::LoadingDetector(pending) => {
                debug!("cancelling detector load");
                drop(pending);
            }
            Phase::OpeningCamera {
                mut detector,
                camera,
            } => {
                debug!("cancelling camera open");
                drop(camera);
                detector.close();
            }
            Phase::WaitingForData {
                mut detector,
                mut camera,
            }
            | Phase::Running {
                mut detector,
                mut camera,
            } => {
                detector.close();
                camera.stop();
            }
        }
        info!("acquisition stopped");
    }

    /// Detector timestamp for the next frame: the tick clock, nudged forward
    /// when frames arrive faster than it advances.
    fn next_stamp(&mut self) -> f64 {
        let stamp = match self.last_stamp_ms {
            Some(last) if self.clock_ms <= last => last + MIN_STAMP_STEP_MS,
            _ => self.clock_ms,
        };
        self.last_stamp_ms = Some(stamp);
        stamp
    }

    fn failed(e: AcquisitionError, classifier: &mut GestureClassifier) -> Phase {
        error!(error = %e, "hand tracking unavailable");
        classifier.fail();
        Phase::Failed(e)
    }
}

impl Drop for Acquisition {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquisition")
            .field("state", &self.state())
            .field("capture", &self.capture)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
