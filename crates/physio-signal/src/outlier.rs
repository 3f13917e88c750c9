//! Jump-based outlier rejection for per-frame measurements.

use serde::{Deserialize, Serialize};

/// Classification of one measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierVerdict {
    /// Within threshold of the last accepted value (or the first value seen)
    Accepted,
    /// Jumped more than the threshold; the reference value is unchanged
    Rejected,
    /// Rejected too many times in a row; the detector re-anchored on this value
    Reseeded,
}

impl OutlierVerdict {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, OutlierVerdict::Rejected)
    }
}

/// Flags a value as an outlier when it jumps more than `threshold` away from
/// the last accepted value.
///
/// A rejected value never updates the reference. With `reseed_after` set, a
/// run of that many consecutive rejections makes the next jumping value the
/// new reference, so a genuinely fast movement cannot starve the pipeline.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    threshold: f64,
    last_accepted: Option<f64>,
    reseed_after: Option<u32>,
    consecutive_rejections: u32,
}

impl OutlierDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            last_accepted: None,
            reseed_after: None,
            consecutive_rejections: 0,
        }
    }

    pub fn with_reseed_after(mut self, rejections: Option<u32>) -> Self {
        self.reseed_after = rejections.filter(|&n| n > 0);
        self
    }

    /// Classify `value` and update the reference on acceptance
    pub fn check(&mut self, value: f64) -> OutlierVerdict {
        let last = match self.last_accepted {
            Some(last) => last,
            None => {
                self.accept(value);
                return OutlierVerdict::Accepted;
            }
        };

        if (value - last).abs() <= self.threshold {
            self.accept(value);
            return OutlierVerdict::Accepted;
        }

        self.consecutive_rejections += 1;
        match self.reseed_after {
            Some(limit) if self.consecutive_rejections > limit => {
                tracing::debug!(
                    from = last,
                    to = value,
                    rejections = self.consecutive_rejections,
                    "outlier detector re-seeded"
                );
                self.accept(value);
                OutlierVerdict::Reseeded
            }
            _ => OutlierVerdict::Rejected,
        }
    }

    pub fn is_outlier(&mut self, value: f64) -> bool {
        !self.check(value).is_accepted()
    }

    fn accept(&mut self, value: f64) {
        self.last_accepted = Some(value);
        self.consecutive_rejections = 0;
    }

    pub fn last_accepted(&self) -> Option<f64> {
        self.last_accepted
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn consecutive_rejections(&self) -> u32 {
        self.consecutive_rejections
    }

    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.consecutive_rejections = 0;
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new(20.0)
    }
}
