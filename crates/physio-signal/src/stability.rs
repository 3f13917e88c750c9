//! Angle stability and summary statistics over recent samples.

use serde::{Deserialize, Serialize};

/// True when the last `frames` samples all lie within `threshold` of their
/// mean. Histories shorter than `frames` are never stable.
pub fn is_stable(history: &[f64], threshold: f64, frames: usize) -> bool {
    if frames == 0 || history.len() < frames {
        return false;
    }

    let recent = &history[history.len() - frames..];
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    recent.iter().all(|v| (v - mean).abs() <= threshold)
}

/// Descriptive statistics of a sample set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
}

impl Statistics {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Self {
            count: values.len(),
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
        }
    }
}
