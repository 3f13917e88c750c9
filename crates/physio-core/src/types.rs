//! Fundamental types for the physiotherapy exercise coach.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session identifier linking a set of repetitions to one exercise run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp wrapper with nanosecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(1_000_000))
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_millis(&self) -> i64 {
        self.0 / 1_000_000
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero
    pub fn millis_since(&self, earlier: Timestamp) -> u64 {
        let delta = self.0.saturating_sub(earlier.0);
        if delta <= 0 {
            0
        } else {
            (delta / 1_000_000) as u64
        }
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// Body side. For alternating exercises this is the side the patient is
/// expected to move next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Closed interval `[min, max]` of a measured value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn center(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    pub fn overlaps(&self, other: &ValueRange) -> bool {
        self.min <= other.max && other.min <= self.max
    }
}

/// 33-point body landmark topology (BlazePose / MediaPipe Pose)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PoseLandmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl PoseLandmark {
    pub const COUNT: usize = 33;

    const ALL: [PoseLandmark; Self::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Pick the left or right member of a bilateral pair
    pub fn for_side(side: Side, left: PoseLandmark, right: PoseLandmark) -> PoseLandmark {
        match side {
            Side::Left => left,
            Side::Right => right,
        }
    }
}

/// A tracked anatomical point in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position in [0, 1] relative to frame width
    pub x: f64,
    /// Vertical position in [0, 1] relative to frame height
    pub y: f64,
    /// Detection confidence in [0, 1]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(x: f64, y: f64, visibility: f32) -> Self {
        Self { x, y, visibility }
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn is_visible(&self, min_visibility: f32) -> bool {
        self.visibility > min_visibility
    }
}

impl Default for Landmark {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// All landmarks detected in one video frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub timestamp: Timestamp,
    /// Indexed by `PoseLandmark`; a short vector means trailing landmarks
    /// were not detected.
    pub landmarks: Vec<Landmark>,
}

impl PoseFrame {
    pub fn new(timestamp: Timestamp, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp,
            landmarks,
        }
    }

    /// A frame with every landmark at the origin and zero visibility
    pub fn empty(timestamp: Timestamp) -> Self {
        Self::new(timestamp, vec![Landmark::default(); PoseLandmark::COUNT])
    }

    pub fn get(&self, landmark: PoseLandmark) -> Option<&Landmark> {
        self.landmarks.get(landmark.index())
    }

    /// Returns the landmark only if its visibility exceeds `min_visibility`
    pub fn visible(&self, landmark: PoseLandmark, min_visibility: f32) -> Option<&Landmark> {
        self.get(landmark).filter(|lm| lm.is_visible(min_visibility))
    }

    pub fn all_visible(&self, landmarks: &[PoseLandmark], min_visibility: f32) -> bool {
        landmarks
            .iter()
            .all(|&lm| self.visible(lm, min_visibility).is_some())
    }

    /// Reject frames with non-finite coordinates or visibility outside `[0, 1]`
    pub fn validate(&self) -> Result<()> {
        for (idx, lm) in self.landmarks.iter().enumerate() {
            if !(lm.x.is_finite() && lm.y.is_finite()) {
                return Err(Error::InvalidInput(format!(
                    "landmark {} has non-finite coordinates",
                    idx
                )));
            }
            if !(0.0..=1.0).contains(&lm.visibility) {
                return Err(Error::InvalidInput(format!(
                    "landmark {} visibility {} outside [0, 1]",
                    idx, lm.visibility
                )));
            }
        }
        Ok(())
    }

    /// Overwrite one landmark, growing the frame if needed
    pub fn set(&mut self, landmark: PoseLandmark, value: Landmark) {
        let idx = landmark.index();
        if self.landmarks.len() <= idx {
            self.landmarks.resize(PoseLandmark::COUNT.max(idx + 1), Landmark::default());
        }
        self.landmarks[idx] = value;
    }
}
