//! Tremor detection from the recent trajectory of one landmark.

use nalgebra::Point2;
use physio_core::distance;
use std::collections::VecDeque;

/// Detects rapid back-and-forth jitter of a tracked point.
///
/// Over the last `window` positions, an interior point "changes" when both
/// its distance to the previous point and to the next point exceed
/// `threshold`. Tremor is reported once at least `min_changes` interior
/// points change.
#[derive(Debug, Clone)]
pub struct TremorDetector {
    threshold: f64,
    window: usize,
    min_changes: usize,
    positions: VecDeque<Point2<f64>>,
}

impl TremorDetector {
    pub fn new(threshold: f64, window: usize, min_changes: usize) -> Self {
        let window = window.max(3);
        Self {
            threshold,
            window,
            min_changes,
            positions: VecDeque::with_capacity(window),
        }
    }

    /// Record a position and report whether the recent window shows tremor
    pub fn update(&mut self, position: Point2<f64>) -> bool {
        if self.positions.len() == self.window {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
        self.is_trembling()
    }

    pub fn is_trembling(&self) -> bool {
        if self.positions.len() < self.window {
            return false;
        }

        let changes = (1..self.positions.len() - 1)
            .filter(|&i| {
                let d1 = distance(&self.positions[i - 1], &self.positions[i]);
                let d2 = distance(&self.positions[i], &self.positions[i + 1]);
                d1 > self.threshold && d2 > self.threshold
            })
            .count();

        changes >= self.min_changes
    }

    pub fn reset(&mut self) {
        self.positions.clear();
    }
}

impl Default for TremorDetector {
    fn default() -> Self {
        Self::new(0.02, 5, 3)
    }
}
