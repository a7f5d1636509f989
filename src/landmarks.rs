//! Hand landmarks and the openness metric.
//!
//! A detected hand arrives as 21 world-space points in the usual
//! hand-landmark ordering: wrist first, then four joints per digit from
//! thumb to pinky. Openness compares how far each fingertip reaches from the
//! wrist against how far its knuckle sits, so a fist scores near 1 and a
//! spread hand near 2 regardless of hand size or camera distance.

use glam::Vec3;

/// Number of points in one hand.
pub const LANDMARK_COUNT: usize = 21;

/// Index of the wrist landmark.
pub const WRIST: usize = 0;

/// Floor for wrist-to-knuckle distances.
pub const DEFAULT_EPSILON: f32 = 0.001;

/// The four fingers that contribute to openness. The thumb is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 4] = [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Landmark index of the knuckle (metacarpophalangeal joint).
    pub fn knuckle(self) -> usize {
        match self {
            Finger::Index => 5,
            Finger::Middle => 9,
            Finger::Ring => 13,
            Finger::Pinky => 17,
        }
    }

    /// Landmark index of the fingertip.
    pub fn tip(self) -> usize {
        self.knuckle() + 3
    }
}

/// One detected hand for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: [Vec3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Vec3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a detector's output; `None` unless exactly 21 points.
    pub fn from_slice(points: &[Vec3]) -> Option<Self> {
        let points: [Vec3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        self.points[index]
    }

    #[inline]
    pub fn wrist(&self) -> Vec3 {
        self.points[WRIST]
    }

    pub fn points(&self) -> &[Vec3; LANDMARK_COUNT] {
        &self.points
    }

    /// Copy with every coordinate multiplied by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            points: self.points.map(|p| p * factor),
        }
    }

    /// Tip reach over knuckle reach for one finger.
    pub fn extension(&self, finger: Finger, epsilon: f32) -> f32 {
        let wrist = self.wrist();
        let knuckle = wrist.distance(self.point(finger.knuckle()));
        let tip = wrist.distance(self.point(finger.tip()));
        tip / knuckle.max(epsilon)
    }

    /// Mean extension of index, middle, ring and pinky.
    ///
    /// Coincident wrist/knuckle points are floored to `epsilon`, which keeps
    /// the ratio finite at the price of inflating it.
    pub fn openness(&self, epsilon: f32) -> f32 {
        let total: f32 = Finger::ALL
            .iter()
            .map(|&finger| self.extension(finger, epsilon))
            .sum();
        total / Finger::ALL.len() as f32
    }
}

/// Openness of `hand` using the default epsilon.
pub fn openness(hand: &LandmarkSet) -> f32 {
    hand.openness(DEFAULT_EPSILON)
}
