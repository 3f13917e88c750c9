//! End-of-session results handed to persistence.

use chrono::{DateTime, Utc};
use physio_core::{SessionId, Side, Timestamp};
use physio_signal::Statistics;
use serde::{Deserialize, Serialize};

use crate::exercise::ExerciseKind;
use crate::state::SessionCounters;

/// Coarse grade of average repetition accuracy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyGrade {
    Excellent,
    Good,
    Fair,
    NeedsImprovement,
}

impl AccuracyGrade {
    pub fn from_percent(accuracy: f64) -> Self {
        if accuracy >= 90.0 {
            AccuracyGrade::Excellent
        } else if accuracy >= 80.0 {
            AccuracyGrade::Good
        } else if accuracy >= 70.0 {
            AccuracyGrade::Fair
        } else {
            AccuracyGrade::NeedsImprovement
        }
    }
}

/// Results of one exercise session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub exercise_id: ExerciseKind,
    pub database_id: u32,
    pub total_reps: u32,
    pub left_reps: u32,
    pub right_reps: u32,
    pub target_reps: u32,
    /// Mean accuracy over counted repetitions
    pub average_accuracy: f64,
    /// Accuracy of the last counted repetition
    pub last_accuracy: f64,
    pub accuracy_stats: Statistics,
    pub grade: AccuracyGrade,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSummary {
    /// Summarize `counters`. The duration runs until completion, or until
    /// `now` for an unfinished session.
    pub fn from_counters(
        session_id: SessionId,
        exercise: ExerciseKind,
        counters: &SessionCounters,
        now: Timestamp,
    ) -> Self {
        let accuracies: Vec<f64> = counters.reps.iter().map(|r| r.accuracy).collect();
        let stats = Statistics::from_values(&accuracies);
        let end = counters.completed_at.unwrap_or(now);

        Self {
            session_id,
            exercise_id: exercise,
            database_id: exercise.database_id(),
            total_reps: counters.total_reps,
            left_reps: counters.reps_on(Side::Left),
            right_reps: counters.reps_on(Side::Right),
            target_reps: counters.target_reps(),
            average_accuracy: stats.mean,
            last_accuracy: accuracies.last().copied().unwrap_or(0.0),
            accuracy_stats: stats,
            grade: AccuracyGrade::from_percent(stats.mean),
            started_at: counters.started_at.to_datetime(),
            duration_secs: end.millis_since(counters.started_at) as f64 / 1000.0,
            completed: counters.completed,
            completed_at: counters.completed_at.map(|t| t.to_datetime()),
        }
    }

    pub fn to_json(&self) -> physio_core::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RepRecord;

    #[test]
    fn test_grades() {
        assert_eq!(AccuracyGrade::from_percent(95.0), AccuracyGrade::Excellent);
        assert_eq!(AccuracyGrade::from_percent(90.0), AccuracyGrade::Excellent);
        assert_eq!(AccuracyGrade::from_percent(85.0), AccuracyGrade::Good);
        assert_eq!(AccuracyGrade::from_percent(70.0), AccuracyGrade::Fair);
        assert_eq!(AccuracyGrade::from_percent(12.0), AccuracyGrade::NeedsImprovement);
    }

    #[test]
    fn test_summary_from_counters() {
        let mut counters = SessionCounters::new(3, 1, Timestamp::from_millis(1_000));
        for (number, side, accuracy) in [(1, Side::Left, 80.0), (2, Side::Right, 100.0)] {
            counters.record(RepRecord {
                number,
                side,
                accuracy,
                value: 85.0,
                counted_at: Timestamp::from_millis(number as i64 * 2_000),
            });
        }

        let summary = SessionSummary::from_counters(
            SessionId::new(),
            ExerciseKind::ArmRaiseForward,
            &counters,
            Timestamp::from_millis(11_000),
        );

        assert_eq!(summary.total_reps, 2);
        assert_eq!(summary.left_reps, 1);
        assert_eq!(summary.right_reps, 1);
        assert_eq!(summary.database_id, 1);
        assert!((summary.average_accuracy - 90.0).abs() < 1e-10);
        assert_eq!(summary.last_accuracy, 100.0);
        assert_eq!(summary.grade, AccuracyGrade::Excellent);
        assert!((summary.duration_secs - 10.0).abs() < 1e-10);
        assert!(!summary.completed);
        assert!(summary.completed_at.is_none());
    }

    #[test]
    fn test_empty_summary() {
        let counters = SessionCounters::new(10, 1, Timestamp::from_millis(0));
        let summary = SessionSummary::from_counters(
            SessionId::new(),
            ExerciseKind::NeckTilt,
            &counters,
            Timestamp::from_millis(5_000),
        );
        assert_eq!(summary.average_accuracy, 0.0);
        assert_eq!(summary.grade, AccuracyGrade::NeedsImprovement);

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"exercise_id\":\"neck-tilt\""));
        assert!(json.contains("\"grade\":\"needs-improvement\""));
    }
}
