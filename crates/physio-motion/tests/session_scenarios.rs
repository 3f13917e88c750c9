//! End-to-end exercise sessions driven by synthetic landmark streams.

use physio_core::{Landmark, PoseFrame, PoseLandmark, Side, Timestamp};
use physio_motion::{
    AnalysisSnapshot, CoachConfig, ExerciseCatalog, ExerciseSession, FeedbackKey, FrameStatus,
    Phase,
};

const FRAME_MS: i64 = 33;

/// Both arms raised forward by `elevation` degrees
fn arm_frame(t_ms: i64, elevation: f64, visibility: f32) -> PoseFrame {
    let mut frame = PoseFrame::empty(Timestamp::from_millis(t_ms));
    let theta = elevation.to_radians();
    for (side, x, dir) in [(Side::Left, 0.6, 1.0), (Side::Right, 0.4, -1.0)] {
        let pick = |l, r| PoseLandmark::for_side(side, l, r);
        let (dx, dy) = (dir * theta.sin(), theta.cos());
        frame.set(
            pick(PoseLandmark::LeftShoulder, PoseLandmark::RightShoulder),
            Landmark::new(x, 0.3, visibility),
        );
        frame.set(
            pick(PoseLandmark::LeftHip, PoseLandmark::RightHip),
            Landmark::new(x, 0.6, visibility),
        );
        frame.set(
            pick(PoseLandmark::LeftElbow, PoseLandmark::RightElbow),
            Landmark::new(x + 0.15 * dx, 0.3 + 0.15 * dy, visibility),
        );
        frame.set(
            pick(PoseLandmark::LeftWrist, PoseLandmark::RightWrist),
            Landmark::new(x + 0.3 * dx, 0.3 + 0.3 * dy, visibility),
        );
    }
    frame
}

/// Seated, both knees at `knee` degrees
fn leg_frame(t_ms: i64, knee: f64) -> PoseFrame {
    let mut frame = PoseFrame::empty(Timestamp::from_millis(t_ms));
    let phi = knee.to_radians();
    for (side, x, dir) in [(Side::Left, 0.55, 1.0), (Side::Right, 0.45, -1.0)] {
        let pick = |l, r| PoseLandmark::for_side(side, l, r);
        frame.set(
            pick(PoseLandmark::LeftHip, PoseLandmark::RightHip),
            Landmark::new(x, 0.5, 0.9),
        );
        frame.set(
            pick(PoseLandmark::LeftKnee, PoseLandmark::RightKnee),
            Landmark::new(x, 0.7, 0.9),
        );
        frame.set(
            pick(PoseLandmark::LeftAnkle, PoseLandmark::RightAnkle),
            Landmark::new(x + dir * 0.2 * phi.sin(), 0.7 - 0.2 * phi.cos(), 0.9),
        );
    }
    frame
}

/// Upper body swayed so the nose sits `offset` thousandths of the frame
/// width from the shoulder midpoint; negative is the patient's left
fn sway_frame(t_ms: i64, offset: f64) -> PoseFrame {
    let mut frame = PoseFrame::empty(Timestamp::from_millis(t_ms));
    frame.set(PoseLandmark::Nose, Landmark::new(0.5 + offset / 1000.0, 0.2, 0.9));
    frame.set(PoseLandmark::LeftShoulder, Landmark::new(0.4, 0.35, 0.9));
    frame.set(PoseLandmark::RightShoulder, Landmark::new(0.6, 0.35, 0.9));
    frame.set(PoseLandmark::LeftHip, Landmark::new(0.42, 0.65, 0.9));
    frame.set(PoseLandmark::RightHip, Landmark::new(0.58, 0.65, 0.9));
    frame
}

fn ramp(from: f64, to: f64, steps: usize) -> Vec<f64> {
    (1..=steps)
        .map(|i| from + (to - from) * i as f64 / steps as f64)
        .collect()
}

fn hold(value: f64, duration_ms: i64) -> Vec<f64> {
    vec![value; (duration_ms / FRAME_MS) as usize]
}

struct Driver {
    session: ExerciseSession,
    t_ms: i64,
}

impl Driver {
    fn start(exercise: &str) -> Self {
        let catalog = ExerciseCatalog::builtin();
        let session = ExerciseSession::start(
            &catalog,
            exercise,
            CoachConfig::default(),
            Timestamp::from_millis(0),
        )
        .unwrap();
        Self { session, t_ms: 0 }
    }

    fn feed(
        &mut self,
        values: &[f64],
        make_frame: impl Fn(i64, f64) -> PoseFrame,
    ) -> Vec<AnalysisSnapshot> {
        values
            .iter()
            .map(|&v| {
                let snapshot = self.session.process_frame(&make_frame(self.t_ms, v));
                self.t_ms += FRAME_MS;
                snapshot
            })
            .collect()
    }

    fn arms(&mut self, values: &[f64]) -> Vec<AnalysisSnapshot> {
        self.feed(values, |t, v| arm_frame(t, v, 0.9))
    }

    fn reps(&self) -> u32 {
        self.session.counters().total_reps
    }
}

#[test]
fn arm_hold_counts_exactly_once() {
    let mut driver = Driver::start("arm-raise-forward");

    driver.arms(&hold(10.0, 330));
    driver.arms(&ramp(10.0, 85.0, 6));
    let snapshots = driver.arms(&hold(85.0, 3000));

    assert_eq!(driver.reps(), 1);
    assert_eq!(snapshots.iter().filter(|s| s.rep_completed).count(), 1);
    assert_eq!(driver.session.counters().reps[0].side, Side::Left);

    let last = snapshots.last().unwrap();
    assert_eq!(last.display_value, Some(85));
    assert_eq!(last.active_side, Side::Right);
    assert!(last.is_stable);
    assert!(!last.tremor_detected);
}

#[test]
fn rearm_requires_passing_through_rest() {
    let mut driver = Driver::start("arm-raise-forward");

    driver.arms(&ramp(10.0, 85.0, 6));
    driver.arms(&hold(85.0, 1500));
    assert_eq!(driver.reps(), 1);

    // 85 -> 90 -> 85 never reaches rest
    driver.arms(&ramp(85.0, 90.0, 2));
    driver.arms(&hold(90.0, 500));
    driver.arms(&ramp(90.0, 85.0, 2));
    driver.arms(&hold(85.0, 1500));
    assert_eq!(driver.reps(), 1);

    driver.arms(&ramp(85.0, 10.0, 8));
    let snapshots = driver.arms(&hold(10.0, 700));
    assert_eq!(snapshots.last().unwrap().phase, Phase::Rest);

    driver.arms(&ramp(10.0, 85.0, 6));
    driver.arms(&hold(85.0, 1500));
    assert_eq!(driver.reps(), 2);

    let counters = driver.session.counters();
    assert_eq!(counters.reps[1].side, Side::Right);
    assert_eq!(driver.session.state().current_side, Side::Left);
}

#[test]
fn leg_extension_end_to_end() {
    let mut driver = Driver::start("leg-extension");

    driver.feed(&hold(90.0, 330), leg_frame);
    // 90 -> 170 over 500 ms
    driver.feed(&ramp(90.0, 170.0, 15), leg_frame);
    driver.feed(&hold(170.0, 1200), leg_frame);
    driver.feed(&ramp(170.0, 90.0, 10), leg_frame);
    let snapshots = driver.feed(&hold(90.0, 700), leg_frame);

    assert_eq!(driver.reps(), 1);
    let last = snapshots.last().unwrap();
    assert_eq!(last.phase, Phase::Rest);
    assert_eq!(last.status, FrameStatus::Tracking);
    assert_eq!(last.reps, 1);
}

#[test]
fn wrong_side_sway_reads_zero() {
    let mut driver = Driver::start("trunk-sway");

    driver.feed(&hold(0.0, 330), sway_frame);
    driver.feed(&ramp(0.0, -100.0, 5), sway_frame);
    driver.feed(&hold(-100.0, 1200), sway_frame);
    assert_eq!(driver.reps(), 1);
    assert_eq!(driver.session.state().current_side, Side::Right);

    // Swaying left again while right is expected never satisfies the target
    driver.feed(&ramp(-100.0, 0.0, 5), sway_frame);
    driver.feed(&ramp(0.0, -100.0, 5), sway_frame);
    let snapshots = driver.feed(&hold(-100.0, 1500), sway_frame);
    assert_eq!(driver.reps(), 1);
    let last = snapshots.last().unwrap();
    assert_eq!(last.value, Some(0.0));
    assert_eq!(last.direction, Some(Side::Left));
    assert_eq!(last.feedback, FeedbackKey::TooLow);

    driver.feed(&ramp(-100.0, 0.0, 5), sway_frame);
    driver.feed(&ramp(0.0, 100.0, 5), sway_frame);
    driver.feed(&hold(100.0, 1200), sway_frame);
    assert_eq!(driver.reps(), 2);
    assert_eq!(driver.session.counters().reps[1].side, Side::Right);
}

#[test]
fn hidden_wrist_blocks_counting() {
    let mut driver = Driver::start("arm-raise-forward");

    driver.arms(&ramp(10.0, 85.0, 6));
    let snapshots = driver.feed(&hold(85.0, 3000), |t, v| {
        let mut frame = arm_frame(t, v, 0.9);
        frame.set(PoseLandmark::LeftWrist, Landmark::new(0.9, 0.3, 0.3));
        frame
    });

    assert_eq!(driver.reps(), 0);
    assert!(snapshots.iter().all(|s| s.status == FrameStatus::Undetected));
    assert!(snapshots.iter().all(|s| s.feedback == FeedbackKey::NotDetected));
}

#[test]
fn single_spike_is_rejected_mid_hold() {
    let mut driver = Driver::start("arm-raise-forward");

    driver.arms(&ramp(10.0, 85.0, 6));
    driver.arms(&hold(85.0, 300));
    let spike = driver.arms(&[150.0]);
    assert_eq!(spike[0].status, FrameStatus::OutlierRejected);
    assert!(spike[0].is_holding);

    driver.arms(&hold(85.0, 1200));
    assert_eq!(driver.reps(), 1);
}

#[test]
fn session_completes_and_summarizes() {
    let catalog = ExerciseCatalog::builtin();
    let mut config = CoachConfig::default();
    config.session.target_reps = 2;
    let session = ExerciseSession::start(
        &catalog,
        "arm-raise-forward",
        config,
        Timestamp::from_millis(0),
    )
    .unwrap();
    let mut driver = Driver { session, t_ms: 0 };

    let mut snapshots = Vec::new();
    for _ in 0..3 {
        driver.arms(&ramp(10.0, 85.0, 6));
        snapshots.extend(driver.arms(&hold(85.0, 1500)));
        driver.arms(&ramp(85.0, 10.0, 8));
        driver.arms(&hold(10.0, 700));
    }

    assert_eq!(driver.reps(), 2);
    assert!(driver.session.is_completed());
    assert_eq!(snapshots.iter().filter(|s| s.session_completed).count(), 1);
    assert_eq!(snapshots.last().unwrap().status, FrameStatus::Completed);

    let summary = driver.session.summary(Timestamp::from_millis(driver.t_ms));
    assert!(summary.completed);
    assert_eq!(summary.total_reps, 2);
    assert_eq!(summary.left_reps, 1);
    assert_eq!(summary.right_reps, 1);
    assert!(summary.completed_at.is_some());
    assert!(summary.average_accuracy > 90.0);

    let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    assert_eq!(json["exercise_id"], "arm-raise-forward");
    assert_eq!(json["database_id"], 1);
}
