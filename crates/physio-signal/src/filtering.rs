//! Recursive smoothing of a single noisy scalar.

use std::collections::VecDeque;

/// Kalman filter for 1D state estimation.
///
/// The state is a constant-position model: prediction leaves the estimate
/// unchanged and only grows its covariance by the process noise. The filter
/// seeds itself from the first measurement it sees.
#[derive(Debug, Clone)]
pub struct KalmanFilter1D {
    /// State estimate, `None` until the first measurement
    x: Option<f64>,
    /// Estimate covariance
    p: f64,
    /// Process noise covariance
    q: f64,
    /// Measurement noise covariance
    r: f64,
}

impl KalmanFilter1D {
    const INITIAL_COVARIANCE: f64 = 1.0;

    /// Create new 1D Kalman filter
    ///
    /// # Arguments
    /// * `process_noise` - Process noise variance (Q)
    /// * `measurement_noise` - Measurement noise variance (R)
    pub fn new(process_noise: f64, measurement_noise: f64) -> Self {
        Self {
            x: None,
            p: Self::INITIAL_COVARIANCE,
            q: process_noise,
            r: measurement_noise,
        }
    }

    /// Update filter with new measurement and return the new estimate
    pub fn filter(&mut self, measurement: f64) -> f64 {
        let x_prev = match self.x {
            Some(x) => x,
            None => {
                self.x = Some(measurement);
                self.p = Self::INITIAL_COVARIANCE;
                return measurement;
            }
        };

        // Predict
        let p_pred = self.p + self.q;

        // Update
        let k = p_pred / (p_pred + self.r); // Kalman gain
        let x = x_prev + k * (measurement - x_prev);
        self.x = Some(x);
        self.p = (1.0 - k) * p_pred;

        x
    }

    /// Filter entire signal from a fresh state
    pub fn filter_signal(&mut self, signal: &[f64]) -> Vec<f64> {
        self.reset();
        signal.iter().map(|&z| self.filter(z)).collect()
    }

    pub fn reset(&mut self) {
        self.x = None;
        self.p = Self::INITIAL_COVARIANCE;
    }

    pub fn is_initialized(&self) -> bool {
        self.x.is_some()
    }

    pub fn state(&self) -> Option<f64> {
        self.x
    }

    pub fn covariance(&self) -> f64 {
        self.p
    }
}

impl Default for KalmanFilter1D {
    fn default() -> Self {
        Self::new(0.01, 0.1)
    }
}

/// Bounded history of the most recent values
#[derive(Debug, Clone)]
pub struct RecentHistory {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RecentHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Contiguous copy, oldest first
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
