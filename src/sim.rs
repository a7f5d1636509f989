//! Simulated camera and hand detector.
//!
//! Lets the installation run, and be tested, without a webcam or a
//! landmark model. A [`SimHandle`] shared with the backend chooses the hand
//! pose the detector reports and advances the video clock; it also records
//! what happened to the resources so teardown can be checked.
//!
//! ```ignore
//! let backend = SimulatedBackend::new();
//! let handle = backend.handle();
//! let mut installation = Installation::new(config, Box::new(backend))?;
//! handle.set_pose(HandPose::Open);
//! handle.next_frame();
//! installation.tick(1.0 / 60.0);
//! ```

use crate::detection::{
    CameraFuture, CaptureDevice, CaptureRequest, Detection, DetectorFuture, DetectorOptions,
    HandDetector, VideoFrame, VisionBackend,
};
use crate::error::AcquisitionError;
use crate::landmarks::{Finger, LandmarkSet, LANDMARK_COUNT, WRIST};
use futures::future::poll_fn;
use futures::FutureExt;
use glam::Vec3;
use std::cell::RefCell;
use std::rc::Rc;
use std::task::Poll;
use tracing::{debug, trace};

/// Wrist-to-knuckle distance of the synthetic hand, in meters.
const KNUCKLE_REACH: f32 = 0.09;

/// Video frame rate of the simulated camera.
pub const SIM_FPS: f64 = 30.0;

const SIM_CONFIDENCE: f32 = 0.95;

/// A hand whose four fingers all have tip/knuckle ratio `extension`.
///
/// The wrist sits at the origin and the fingers fan out in the XY plane,
/// so the hand's openness is exactly `extension`.
pub fn synthetic_hand(extension: f32) -> LandmarkSet {
    let mut points = [Vec3::ZERO; LANDMARK_COUNT];
    points[WRIST] = Vec3::ZERO;

    // Thumb, landmarks 1..=4.
    for (joint, point) in points[1..5].iter_mut().enumerate() {
        let step = (joint + 1) as f32;
        *point = Vec3::new(-0.025 * step, 0.02 * step, 0.01);
    }

    for (i, finger) in Finger::ALL.into_iter().enumerate() {
        let spread = (i as f32 - 1.5) * 0.15;
        let knuckle = Vec3::new(spread.sin(), spread.cos(), 0.0) * KNUCKLE_REACH;
        let tip = knuckle * extension;
        let base = finger.knuckle();
        points[base] = knuckle;
        points[base + 1] = knuckle.lerp(tip, 1.0 / 3.0);
        points[base + 2] = knuckle.lerp(tip, 2.0 / 3.0);
        points[finger.tip()] = tip;
    }
    LandmarkSet::new(points)
}

/// What the simulated detector sees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum HandPose {
    /// Fingers spread, openness 2.0.
    Open,
    /// Fingers curled, openness 1.1.
    Fist,
    /// No hand in frame.
    #[default]
    Absent,
    /// Every finger at the given tip/knuckle ratio.
    Custom(f32),
}

impl HandPose {
    pub fn extension(self) -> Option<f32> {
        match self {
            HandPose::Open => Some(2.0),
            HandPose::Fist => Some(1.1),
            HandPose::Absent => None,
            HandPose::Custom(ratio) => Some(ratio),
        }
    }

    pub fn detection(self) -> Detection {
        match self.extension() {
            Some(ratio) => Detection::hand(synthetic_hand(ratio), Some(SIM_CONFIDENCE)),
            None => Detection::none(),
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    pose: HandPose,
    video_time: f64,
    detector_loads: usize,
    detector_loaded: bool,
    detector_closed: bool,
    camera_open: bool,
    camera_stops: usize,
    detections: usize,
    detector_timestamps: Vec<f64>,
}

/// Control and inspection side of a [`SimulatedBackend`].
#[derive(Debug, Clone, Default)]
pub struct SimHandle {
    state: Rc<RefCell<SimState>>,
}

impl SimHandle {
    pub fn pose(&self) -> HandPose {
        self.state.borrow().pose
    }

    pub fn set_pose(&self, pose: HandPose) {
        let mut state = self.state.borrow_mut();
        if state.pose != pose {
            debug!(?pose, "simulated hand pose");
        }
        state.pose = pose;
    }

    /// Advance the video clock by `seconds` of wall time.
    pub fn advance(&self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.state.borrow_mut().video_time += f64::from(seconds);
        }
    }

    /// Advance the video clock by exactly one frame.
    pub fn next_frame(&self) {
        self.state.borrow_mut().video_time += 1.0 / SIM_FPS;
    }

    /// Timestamp of the frame currently shown, quantized to the frame rate.
    pub fn video_time(&self) -> f64 {
        let t = self.state.borrow().video_time;
        (t * SIM_FPS + 1e-6).floor() / SIM_FPS
    }

    pub fn detector_loads(&self) -> usize {
        self.state.borrow().detector_loads
    }

    pub fn detector_loaded(&self) -> bool {
        self.state.borrow().detector_loaded
    }

    pub fn detector_closed(&self) -> bool {
        self.state.borrow().detector_closed
    }

    pub fn camera_open(&self) -> bool {
        self.state.borrow().camera_open
    }

    /// The camera was opened and has since been stopped.
    pub fn camera_stopped(&self) -> bool {
        self.state.borrow().camera_stops > 0
    }

    pub fn camera_stop_count(&self) -> usize {
        self.state.borrow().camera_stops
    }

    /// Number of frames the detector has processed.
    pub fn detections(&self) -> usize {
        self.state.borrow().detections
    }

    /// Timestamps handed to the detector, in call order.
    pub fn detector_timestamps(&self) -> Vec<f64> {
        self.state.borrow().detector_timestamps.clone()
    }

    /// Nothing acquired is still held.
    pub fn released(&self) -> bool {
        let state = self.state.borrow();
        (!state.detector_loaded || state.detector_closed)
            && (!state.camera_open || state.camera_stops > 0)
    }
}

/// Vision backend backed by [`SimHandle`] state.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBackend {
    handle: SimHandle,
    pending_polls: usize,
    detector_failure: Option<String>,
    camera_failure: Option<String>,
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each startup step stays pending for `polls` polls before resolving.
    pub fn with_pending_polls(mut self, polls: usize) -> Self {
        self.pending_polls = polls;
        self
    }

    pub fn with_detector_failure(mut self, reason: impl Into<String>) -> Self {
        self.detector_failure = Some(reason.into());
        self
    }

    pub fn with_camera_failure(mut self, reason: impl Into<String>) -> Self {
        self.camera_failure = Some(reason.into());
        self
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }
}

impl VisionBackend for SimulatedBackend {
    fn load_detector(&mut self, options: &DetectorOptions) -> DetectorFuture {
        self.handle.state.borrow_mut().detector_loads += 1;
        let state = Rc::clone(&self.handle.state);
        let failure = self.detector_failure.clone();
        let mut remaining = self.pending_polls;
        let num_hands = options.num_hands;
        poll_fn(move |_| {
            if remaining > 0 {
                remaining -= 1;
                return Poll::Pending;
            }
            if let Some(reason) = &failure {
                return Poll::Ready(Err(AcquisitionError::DetectionInit(reason.clone())));
            }
            state.borrow_mut().detector_loaded = true;
            let detector: Box<dyn HandDetector> = Box::new(SimDetector {
                state: Rc::clone(&state),
                num_hands,
                closed: false,
            });
            Poll::Ready(Ok(detector))
        })
        .boxed_local()
    }

    fn open_camera(&mut self, request: &CaptureRequest) -> CameraFuture {
        let state = Rc::clone(&self.handle.state);
        let failure = self.camera_failure.clone();
        let mut remaining = self.pending_polls;
        let request = *request;
        poll_fn(move |_| {
            if remaining > 0 {
                remaining -= 1;
                return Poll::Pending;
            }
            if let Some(reason) = &failure {
                return Poll::Ready(Err(AcquisitionError::Acquisition(reason.clone())));
            }
            state.borrow_mut().camera_open = true;
            let camera: Box<dyn CaptureDevice> = Box::new(SimCamera {
                handle: SimHandle {
                    state: Rc::clone(&state),
                },
                request,
                stopped: false,
            });
            Poll::Ready(Ok(camera))
        })
        .boxed_local()
    }
}

struct SimCamera {
    handle: SimHandle,
    request: CaptureRequest,
    stopped: bool,
}

impl CaptureDevice for SimCamera {
    fn latest_frame(&mut self) -> Option<VideoFrame> {
        if self.stopped {
            return None;
        }
        Some(VideoFrame {
            timestamp: self.handle.video_time(),
            width: self.request.width,
            height: self.request.height,
        })
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.handle.state.borrow_mut().camera_stops += 1;
    }
}

struct SimDetector {
    state: Rc<RefCell<SimState>>,
    num_hands: usize,
    closed: bool,
}

impl HandDetector for SimDetector {
    fn detect(&mut self, frame: &VideoFrame, timestamp_ms: f64) -> Detection {
        if self.closed || self.num_hands == 0 {
            return Detection::none();
        }
        let mut state = self.state.borrow_mut();
        state.detections += 1;
        state.detector_timestamps.push(timestamp_ms);
        trace!(video_time = frame.timestamp, timestamp_ms, pose = ?state.pose, "simulated detection");
        state.pose.detection()
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.state.borrow_mut().detector_closed = true;
    }
}
