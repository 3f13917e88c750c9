//! Runtime tuning for the exercise coach.

use physio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete coach configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    /// Kalman smoothing parameters
    pub smoothing: SmoothingConfig,

    /// Outlier rejection thresholds
    pub outlier: OutlierConfig,

    /// Feedback message thresholds
    pub feedback: FeedbackConfig,

    /// Angle stability window
    pub stability: StabilityConfig,

    /// Tremor detection window
    pub tremor: TremorConfig,

    /// Repetition goals
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Process noise variance (Q)
    pub process_noise: f64,

    /// Measurement noise variance (R)
    pub measurement_noise: f64,

    /// Number of recent smoothed values retained
    pub history_len: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            process_noise: 0.01,
            measurement_noise: 0.1,
            history_len: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Maximum frame-to-frame jump for joint angles (degrees)
    pub degrees_threshold: f64,

    /// Maximum frame-to-frame jump for head offsets (thousandths of frame width)
    pub offset_threshold: f64,

    /// Consecutive rejections after which the detector re-anchors
    pub reseed_after: Option<u32>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            degrees_threshold: 20.0,
            offset_threshold: 100.0,
            reseed_after: Some(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Band beyond each target edge reported as "approaching" rather than
    /// too low / too high
    pub tolerance: f64,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { tolerance: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Maximum deviation from the window mean
    pub threshold: f64,

    /// Window length in frames
    pub frames: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            threshold: 3.0,
            frames: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TremorConfig {
    /// Minimum per-frame displacement (normalized units)
    pub threshold: f64,

    /// Positions examined
    pub window: usize,

    /// Jittering points required within the window
    pub min_changes: usize,
}

impl Default for TremorConfig {
    fn default() -> Self {
        Self {
            threshold: 0.02,
            window: 5,
            min_changes: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Repetitions per set
    pub target_reps: u32,

    /// Sets per session
    pub target_sets: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            target_reps: 10,
            target_sets: 1,
        }
    }
}

impl CoachConfig {
    /// Load configuration from file, with `PHYSIO_` environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let loaded: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(Self::environment())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let loaded: Self = settings
            .try_deserialize()
            .map_err(|e| Error::Config(e.to_string()))?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix("PHYSIO")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("smoothing.process_noise", self.smoothing.process_noise),
            ("smoothing.measurement_noise", self.smoothing.measurement_noise),
            ("outlier.degrees_threshold", self.outlier.degrees_threshold),
            ("outlier.offset_threshold", self.outlier.offset_threshold),
            ("stability.threshold", self.stability.threshold),
            ("tremor.threshold", self.tremor.threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
            }
        }

        if !(self.feedback.tolerance.is_finite() && self.feedback.tolerance >= 0.0) {
            return Err(Error::Config(format!(
                "feedback.tolerance must be non-negative, got {}",
                self.feedback.tolerance
            )));
        }
        if self.smoothing.history_len == 0 {
            return Err(Error::Config("smoothing.history_len must be at least 1".into()));
        }
        if self.stability.frames == 0 {
            return Err(Error::Config("stability.frames must be at least 1".into()));
        }
        if self.tremor.window < 3 {
            return Err(Error::Config("tremor.window must be at least 3".into()));
        }
        if self.session.target_reps == 0 || self.session.target_sets == 0 {
            return Err(Error::Config("session targets must be at least 1".into()));
        }
        Ok(())
    }
}
