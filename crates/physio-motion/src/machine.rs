//! Repetition and hold state machine.

use physio_core::{Side, Timestamp, ValueRange};
use physio_signal::{KalmanFilter1D, OutlierDetector};

use crate::config::CoachConfig;
use crate::exercise::{ExerciseDefinition, Unit};
use crate::extractor::Extraction;
use crate::snapshot::FrameStatus;
use crate::state::{ExerciseState, Phase, RepRecord, SessionCounters};

/// Result of feeding one frame to the state machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub status: FrameStatus,
    /// Repetition counted on this frame
    pub rep: Option<RepRecord>,
    /// This frame completed the session
    pub session_completed: bool,
    /// Expected side changed on this frame
    pub side_switched: bool,
}

impl StepOutcome {
    fn status(status: FrameStatus) -> Self {
        Self {
            status,
            rep: None,
            session_completed: false,
            side_switched: false,
        }
    }
}

/// Instantaneous accuracy: 100 at the target center, falling linearly to 0
/// at either edge.
pub fn accuracy(value: f64, target: &ValueRange) -> f64 {
    let half_span = target.span() / 2.0;
    if half_span <= 0.0 {
        return 0.0;
    }
    (100.0 - (value - target.center()).abs() / half_span * 100.0).clamp(0.0, 100.0)
}

/// Drives one exercise from smoothed measurements to counted repetitions.
///
/// Owns the smoothing filter and outlier detector of the exercise; a new
/// exercise needs a new machine.
#[derive(Debug, Clone)]
pub struct RepStateMachine {
    definition: ExerciseDefinition,
    state: ExerciseState,
    filter: KalmanFilter1D,
    outlier: OutlierDetector,
    history_len: usize,
}

impl RepStateMachine {
    pub fn new(definition: ExerciseDefinition, config: &CoachConfig) -> Self {
        let threshold = match definition.unit() {
            Unit::Degrees => config.outlier.degrees_threshold,
            Unit::OffsetThousandths => config.outlier.offset_threshold,
        };
        // History must cover the stability window
        let history_len = config.smoothing.history_len.max(config.stability.frames);

        Self {
            definition,
            state: ExerciseState::new(history_len),
            filter: KalmanFilter1D::new(
                config.smoothing.process_noise,
                config.smoothing.measurement_noise,
            ),
            outlier: OutlierDetector::new(threshold).with_reseed_after(config.outlier.reseed_after),
            history_len,
        }
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        &self.definition
    }

    pub fn state(&self) -> &ExerciseState {
        &self.state
    }

    pub fn active_side(&self) -> Side {
        self.state.current_side
    }

    /// Feed one frame's extraction. `None` means the pose was not detected.
    pub fn step(
        &mut self,
        extraction: Option<&Extraction>,
        now: Timestamp,
        counters: &mut SessionCounters,
    ) -> StepOutcome {
        if counters.completed {
            return StepOutcome::status(FrameStatus::Completed);
        }

        let Some(extraction) = extraction else {
            tracing::trace!(exercise = %self.definition.kind, "pose not detected");
            return StepOutcome::status(FrameStatus::Undetected);
        };

        self.state.observe(extraction);

        if !self.outlier.check(extraction.value).is_accepted() {
            tracing::debug!(
                exercise = %self.definition.kind,
                value = extraction.value,
                reference = ?self.outlier.last_accepted(),
                "outlier rejected"
            );
            return StepOutcome::status(FrameStatus::OutlierRejected);
        }

        let smoothed = self.filter.filter(extraction.value);
        self.state.record_smoothed(smoothed);

        self.advance(smoothed, now, counters)
    }

    fn advance(
        &mut self,
        value: f64,
        now: Timestamp,
        counters: &mut SessionCounters,
    ) -> StepOutcome {
        let mut outcome = StepOutcome::status(FrameStatus::Tracking);
        let target = self.definition.target;

        if !target.contains(value) {
            self.state.clear_hold();
            if self.definition.rest.contains(value) {
                if self.state.rep_counted {
                    self.state.rep_counted = false;
                    self.state.consecutive_good_frames = 0;
                    tracing::debug!(
                        exercise = %self.definition.kind,
                        "returned to rest, next repetition armed"
                    );
                }
                self.state.phase = Phase::Rest;
            } else {
                self.state.phase = Phase::Moving;
            }
            return outcome;
        }

        let started = match self.state.hold_started_at {
            Some(started) => started,
            None => {
                self.state.hold_started_at = Some(now);
                self.state.phase = Phase::Holding;
                now
            }
        };

        let held_ms = now.millis_since(started);
        let required_ms = self.definition.hold_duration_ms;
        self.state.hold_progress = (held_ms as f64 / required_ms as f64 * 100.0).min(100.0);
        self.state.accuracy = accuracy(value, &target);
        self.state.consecutive_good_frames = self.state.consecutive_good_frames.saturating_add(1);

        if held_ms >= required_ms && !self.state.rep_counted {
            self.state.rep_counted = true;

            let rep = RepRecord {
                number: counters.total_reps + 1,
                side: self.state.current_side,
                accuracy: self.state.accuracy,
                value,
                counted_at: now,
            };
            outcome.session_completed = counters.record(rep);
            outcome.rep = Some(rep);

            tracing::info!(
                exercise = %self.definition.kind,
                rep = rep.number,
                target = counters.target_reps(),
                side = rep.side.as_str(),
                accuracy = rep.accuracy,
                "repetition counted"
            );

            if outcome.session_completed {
                tracing::info!(
                    exercise = %self.definition.kind,
                    reps = counters.total_reps,
                    "exercise session completed"
                );
            }

            if self.definition.alternating {
                self.switch_side();
                outcome.side_switched = true;
            }
        }

        outcome
    }

    /// Hand the turn to the other side. The measured limb changes, so the
    /// smoothing and outlier references restart from the next sample.
    fn switch_side(&mut self) {
        self.state.current_side = self.state.current_side.opposite();
        self.filter.reset();
        self.outlier.reset();
        tracing::info!(
            exercise = %self.definition.kind,
            side = self.state.current_side.as_str(),
            "switching side"
        );
    }

    /// Restart the exercise from rest with fresh filters
    pub fn reset(&mut self) {
        self.state = ExerciseState::new(self.history_len);
        self.filter.reset();
        self.outlier.reset();
    }
}
