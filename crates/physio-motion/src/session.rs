//! One patient's run through one exercise.

use physio_core::{PoseFrame, Result, SessionId, Timestamp};
use physio_signal::{is_stable, TremorDetector};

use crate::config::CoachConfig;
use crate::exercise::{ExerciseCatalog, ExerciseDefinition};
use crate::extractor::extract;
use crate::machine::RepStateMachine;
use crate::snapshot::{AnalysisSnapshot, FrameFacts, SnapshotBuilder};
use crate::state::{ExerciseState, SessionCounters};
use crate::summary::SessionSummary;

/// Frame-processing entry point for an exercise session.
///
/// Owns every piece of mutable state for the selected exercise. Frames must
/// be fed one at a time, in timestamp order.
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    id: SessionId,
    catalog: ExerciseCatalog,
    config: CoachConfig,
    machine: RepStateMachine,
    counters: SessionCounters,
    tremor: TremorDetector,
    snapshots: SnapshotBuilder,
}

impl ExerciseSession {
    /// Start a session for `exercise_id`.
    ///
    /// Fails on an unknown exercise or an invalid configuration, before any
    /// frame is processed.
    pub fn start(
        catalog: &ExerciseCatalog,
        exercise_id: &str,
        config: CoachConfig,
        started_at: Timestamp,
    ) -> Result<Self> {
        config.validate()?;
        let definition = catalog.lookup(exercise_id)?.clone();

        let session = Self {
            id: SessionId::new(),
            catalog: catalog.clone(),
            machine: RepStateMachine::new(definition, &config),
            counters: Self::fresh_counters(&config, started_at),
            tremor: Self::fresh_tremor(&config),
            snapshots: SnapshotBuilder::new(config.feedback.tolerance),
            config,
        };

        tracing::info!(
            session = %session.id.0,
            exercise = exercise_id,
            target_reps = session.counters.target_reps(),
            "exercise session started"
        );

        Ok(session)
    }

    fn fresh_counters(config: &CoachConfig, started_at: Timestamp) -> SessionCounters {
        SessionCounters::new(
            config.session.target_reps,
            config.session.target_sets,
            started_at,
        )
    }

    fn fresh_tremor(config: &CoachConfig) -> TremorDetector {
        TremorDetector::new(
            config.tremor.threshold,
            config.tremor.window,
            config.tremor.min_changes,
        )
    }

    /// Process one frame and describe the result
    pub fn process_frame(&mut self, frame: &PoseFrame) -> AnalysisSnapshot {
        let definition = self.machine.definition();
        let active_side = self.machine.active_side();

        let extraction = match frame.validate() {
            Ok(()) => extract(frame, definition, active_side),
            Err(e) => {
                tracing::debug!(error = %e, "malformed frame treated as undetected");
                None
            }
        };
        let pose_confidence = definition.weighted_visibility(frame);

        let mut tremor_detected = self.tremor.is_trembling();
        if extraction.is_some() {
            let tracked = definition.measurement.tracked_landmark(active_side);
            if let Some(point) = frame.visible(tracked, definition.min_visibility) {
                tremor_detected = self.tremor.update(point.to_nalgebra());
            }
        }

        let outcome = self
            .machine
            .step(extraction.as_ref(), frame.timestamp, &mut self.counters);

        if outcome.side_switched {
            self.tremor.reset();
        }

        let stability = &self.config.stability;
        let history = self.machine.state().history.to_vec();
        let stable = is_stable(&history, stability.threshold, stability.frames);

        let facts = FrameFacts {
            timestamp: frame.timestamp,
            status: outcome.status,
            is_stable: stable,
            tremor_detected,
            pose_confidence,
            rep_completed: outcome.rep.is_some(),
            session_completed: outcome.session_completed,
        };

        self.snapshots.build(
            self.machine.definition(),
            self.machine.state(),
            &self.counters,
            facts,
        )
    }

    /// Switch to another exercise. All smoothing state and counters are
    /// discarded; on failure the current exercise is left untouched.
    pub fn switch_exercise(&mut self, exercise_id: &str, now: Timestamp) -> Result<()> {
        let definition = self.catalog.lookup(exercise_id)?.clone();

        tracing::info!(
            from = %self.machine.definition().kind,
            to = exercise_id,
            "switching exercise"
        );

        self.id = SessionId::new();
        self.machine = RepStateMachine::new(definition, &self.config);
        self.counters = Self::fresh_counters(&self.config, now);
        self.tremor = Self::fresh_tremor(&self.config);
        Ok(())
    }

    /// Restart the current exercise from zero repetitions
    pub fn reset(&mut self, now: Timestamp) {
        tracing::debug!(
            exercise = %self.machine.definition().kind,
            "exercise session reset"
        );
        self.machine.reset();
        self.counters = Self::fresh_counters(&self.config, now);
        self.tremor.reset();
    }

    pub fn summary(&self, now: Timestamp) -> SessionSummary {
        SessionSummary::from_counters(
            self.id,
            self.machine.definition().kind,
            &self.counters,
            now,
        )
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn definition(&self) -> &ExerciseDefinition {
        self.machine.definition()
    }

    pub fn state(&self) -> &ExerciseState {
        self.machine.state()
    }

    pub fn counters(&self) -> &SessionCounters {
        &self.counters
    }

    pub fn config(&self) -> &CoachConfig {
        &self.config
    }

    pub fn is_completed(&self) -> bool {
        self.counters.completed
    }
}
