//! Mutable per-exercise state and session counters.

use physio_core::{Side, Timestamp};
use physio_signal::RecentHistory;
use serde::{Deserialize, Serialize};

use crate::extractor::Extraction;

/// Movement phase of the current repetition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Inside the rest range, or not yet measured
    #[default]
    Rest,
    /// Between the rest and target ranges
    Moving,
    /// Inside the target range
    Holding,
}

/// State of the exercise currently being performed.
///
/// `phase == Holding` implies `hold_started_at.is_some()`. `rep_counted` is
/// only set while in the target range and only cleared in the rest range.
#[derive(Debug, Clone)]
pub struct ExerciseState {
    pub phase: Phase,
    /// Last extracted value, including rejected outliers
    pub last_raw: Option<f64>,
    /// Last smoothed value
    pub smoothed: Option<f64>,
    /// Recent smoothed values, oldest first
    pub history: RecentHistory,
    pub hold_started_at: Option<Timestamp>,
    /// Hold progress in `[0, 100]`
    pub hold_progress: f64,
    /// A repetition has been counted for the current hold episode
    pub rep_counted: bool,
    /// Side expected to move for alternating exercises
    pub current_side: Side,
    pub left_value: Option<f64>,
    pub right_value: Option<f64>,
    pub direction: Option<Side>,
    pub consecutive_good_frames: u32,
    /// Instantaneous accuracy in `[0, 100]`, zero outside the target range
    pub accuracy: f64,
}

impl ExerciseState {
    pub fn new(history_len: usize) -> Self {
        Self {
            phase: Phase::Rest,
            last_raw: None,
            smoothed: None,
            history: RecentHistory::new(history_len),
            hold_started_at: None,
            hold_progress: 0.0,
            rep_counted: false,
            current_side: Side::Left,
            left_value: None,
            right_value: None,
            direction: None,
            consecutive_good_frames: 0,
            accuracy: 0.0,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.phase == Phase::Holding
    }

    /// Record display values of a new extraction
    pub fn observe(&mut self, extraction: &Extraction) {
        self.last_raw = Some(extraction.value);
        self.left_value = extraction.left;
        self.right_value = extraction.right;
        self.direction = extraction.direction;
    }

    pub fn record_smoothed(&mut self, value: f64) {
        self.smoothed = Some(value);
        self.history.push(value);
    }

    pub fn clear_hold(&mut self) {
        self.hold_started_at = None;
        self.hold_progress = 0.0;
        self.accuracy = 0.0;
    }
}

/// One counted repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    /// 1-based repetition number within the session
    pub number: u32,
    pub side: Side,
    /// Accuracy at the moment the repetition was counted
    pub accuracy: f64,
    /// Smoothed value at the moment the repetition was counted
    pub value: f64,
    pub counted_at: Timestamp,
}

/// Repetition totals of one exercise session.
///
/// Only the state machine increments these, through [`SessionCounters::record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub total_reps: u32,
    pub reps_per_set: u32,
    pub target_sets: u32,
    pub started_at: Timestamp,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub reps: Vec<RepRecord>,
}

impl SessionCounters {
    pub fn new(reps_per_set: u32, target_sets: u32, started_at: Timestamp) -> Self {
        Self {
            total_reps: 0,
            reps_per_set: reps_per_set.max(1),
            target_sets: target_sets.max(1),
            started_at,
            completed: false,
            completed_at: None,
            reps: Vec::new(),
        }
    }

    /// Repetitions needed to complete the session
    pub fn target_reps(&self) -> u32 {
        self.reps_per_set.saturating_mul(self.target_sets)
    }

    /// 1-based set currently in progress
    pub fn current_set(&self) -> u32 {
        (self.total_reps / self.reps_per_set + 1).min(self.target_sets)
    }

    pub fn remaining(&self) -> u32 {
        self.target_reps().saturating_sub(self.total_reps)
    }

    pub fn reps_on(&self, side: Side) -> u32 {
        self.reps.iter().filter(|r| r.side == side).count() as u32
    }

    /// Count a repetition. Returns true if this completed the session.
    /// Ignored once the session is complete.
    pub fn record(&mut self, rep: RepRecord) -> bool {
        if self.completed {
            return false;
        }

        self.total_reps += 1;
        let counted_at = rep.counted_at;
        self.reps.push(rep);

        if self.total_reps >= self.target_reps() {
            self.completed = true;
            self.completed_at = Some(counted_at);
            return true;
        }
        false
    }
}
