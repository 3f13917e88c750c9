//! Read-only per-frame analysis record for renderers and persistence.

use physio_core::{Side, Timestamp, ValueRange};
use serde::{Deserialize, Serialize};

use crate::exercise::{ExerciseDefinition, ExerciseKind, Unit};
use crate::state::{ExerciseState, Phase, SessionCounters};

/// How the current frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStatus {
    /// Measurement accepted and the state machine advanced
    Tracking,
    /// A required landmark was not visible
    Undetected,
    /// Measurement jumped too far and was dropped
    OutlierRejected,
    /// Session already complete; nothing is counted any more
    Completed,
}

/// Feedback category for the current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKey {
    NotDetected,
    /// Below the target by more than the tolerance
    TooLow,
    /// Above the target by more than the tolerance
    TooHigh,
    /// Within the tolerance band outside the target
    Approaching,
    /// In target, hold not yet complete
    Holding,
    /// In target, hold complete
    Perfect,
}

impl FeedbackKey {
    /// `tolerance` is the band beyond each target edge reported as
    /// approaching rather than too low or too high
    pub fn classify(
        value: Option<f64>,
        target: &ValueRange,
        tolerance: f64,
        hold_progress: f64,
    ) -> Self {
        let Some(value) = value else {
            return FeedbackKey::NotDetected;
        };

        if target.contains(value) {
            if hold_progress >= 100.0 {
                FeedbackKey::Perfect
            } else {
                FeedbackKey::Holding
            }
        } else if value < target.min - tolerance {
            FeedbackKey::TooLow
        } else if value > target.max + tolerance {
            FeedbackKey::TooHigh
        } else {
            FeedbackKey::Approaching
        }
    }

    /// English text for hosts without their own localization
    pub fn default_message(&self) -> &'static str {
        match self {
            FeedbackKey::NotDetected => "Step back so your whole body is visible",
            FeedbackKey::TooLow => "Move further",
            FeedbackKey::TooHigh => "Too far, ease back a little",
            FeedbackKey::Approaching => "Almost there",
            FeedbackKey::Holding => "Hold that position",
            FeedbackKey::Perfect => "Perfect! Now return to the start",
        }
    }
}

/// Frame-level analysis handed to collaborators. Recreated every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSnapshot {
    pub timestamp: Timestamp,
    pub exercise_id: ExerciseKind,
    pub status: FrameStatus,
    pub phase: Phase,
    pub unit: Unit,
    /// Current smoothed value
    pub value: Option<f64>,
    /// Smoothed value rounded for display
    pub display_value: Option<i64>,
    pub target: ValueRange,
    pub rest: ValueRange,
    pub accuracy: f64,
    pub is_holding: bool,
    pub hold_progress: f64,
    pub hold_duration_ms: u64,
    pub active_side: Side,
    pub left_value: Option<f64>,
    pub right_value: Option<f64>,
    pub direction: Option<Side>,
    pub reps: u32,
    pub target_reps: u32,
    pub current_set: u32,
    pub target_sets: u32,
    pub feedback: FeedbackKey,
    pub is_stable: bool,
    pub tremor_detected: bool,
    pub pose_confidence: f32,
    /// A repetition was counted on this frame
    pub rep_completed: bool,
    /// This frame completed the session
    pub session_completed: bool,
}

/// Per-frame facts that live outside the exercise state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameFacts {
    pub timestamp: Timestamp,
    pub status: FrameStatus,
    pub is_stable: bool,
    pub tremor_detected: bool,
    pub pose_confidence: f32,
    pub rep_completed: bool,
    pub session_completed: bool,
}

/// Assembles snapshots
#[derive(Debug, Clone, Copy)]
pub struct SnapshotBuilder {
    tolerance: f64,
}

impl SnapshotBuilder {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn build(
        &self,
        definition: &ExerciseDefinition,
        state: &ExerciseState,
        counters: &SessionCounters,
        facts: FrameFacts,
    ) -> AnalysisSnapshot {
        let feedback = if facts.status == FrameStatus::Undetected {
            FeedbackKey::NotDetected
        } else {
            FeedbackKey::classify(
                state.smoothed,
                &definition.target,
                self.tolerance,
                state.hold_progress,
            )
        };

        AnalysisSnapshot {
            timestamp: facts.timestamp,
            exercise_id: definition.kind,
            status: facts.status,
            phase: state.phase,
            unit: definition.unit(),
            value: state.smoothed,
            display_value: state.smoothed.map(|v| v.round() as i64),
            target: definition.target,
            rest: definition.rest,
            accuracy: state.accuracy,
            is_holding: state.is_holding(),
            hold_progress: state.hold_progress,
            hold_duration_ms: definition.hold_duration_ms,
            active_side: state.current_side,
            left_value: state.left_value,
            right_value: state.right_value,
            direction: state.direction,
            reps: counters.total_reps,
            target_reps: counters.target_reps(),
            current_set: counters.current_set(),
            target_sets: counters.target_sets,
            feedback,
            is_stable: facts.is_stable,
            tremor_detected: facts.tremor_detected,
            pose_confidence: facts.pose_confidence,
            rep_completed: facts.rep_completed,
            session_completed: facts.session_completed,
        }
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new(10.0)
    }
}
