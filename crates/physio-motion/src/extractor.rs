//! Per-frame measurement extraction.

use physio_core::{horizontal_offset, joint_angle, PoseFrame, PoseLandmark, Side};
use serde::{Deserialize, Serialize};

use crate::exercise::{ExerciseDefinition, JointChain, Measurement};

/// Values extracted from one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Representative value that drives the state machine
    pub value: f64,
    /// Left side value for display, absent when not visible
    pub left: Option<f64>,
    /// Right side value for display, absent when not visible
    pub right: Option<f64>,
    /// Direction of a head offset; `None` for joint angles or a centered head
    pub direction: Option<Side>,
}

/// Extract the exercise's measurement from `frame`.
///
/// Returns `None` when any required landmark is not visible; the caller must
/// not advance the state machine on that frame.
pub fn extract(
    frame: &PoseFrame,
    definition: &ExerciseDefinition,
    active_side: Side,
) -> Option<Extraction> {
    let min_visibility = definition.min_visibility;
    if !frame.all_visible(&definition.required_landmarks(active_side), min_visibility) {
        return None;
    }

    match definition.measurement {
        Measurement::JointAngle { chain } => {
            let left = chain_angle(frame, chain, Side::Left, min_visibility);
            let right = chain_angle(frame, chain, Side::Right, min_visibility);

            let value = if definition.alternating {
                match active_side {
                    Side::Left => left?,
                    Side::Right => right?,
                }
            } else {
                left?.max(right?)
            };

            Some(Extraction {
                value,
                left,
                right,
                direction: None,
            })
        }
        Measurement::HeadOffset { scale, .. } => {
            let nose = frame.get(PoseLandmark::Nose)?;
            let left_shoulder = frame.get(PoseLandmark::LeftShoulder)?;
            let right_shoulder = frame.get(PoseLandmark::RightShoulder)?;

            let offset = horizontal_offset(nose, left_shoulder, right_shoulder) * scale;
            let magnitude = offset.abs();
            // Mirrored selfie view: a negative offset is the patient's left
            let direction = if offset < 0.0 {
                Some(Side::Left)
            } else if offset > 0.0 {
                Some(Side::Right)
            } else {
                None
            };

            let toward = |side: Side| if direction == Some(side) { magnitude } else { 0.0 };

            let value = if definition.alternating {
                toward(active_side)
            } else {
                magnitude
            };

            Some(Extraction {
                value,
                left: Some(toward(Side::Left)),
                right: Some(toward(Side::Right)),
                direction,
            })
        }
    }
}

/// Joint angle of one side, `None` unless every landmark of the chain is visible
fn chain_angle(
    frame: &PoseFrame,
    chain: JointChain,
    side: Side,
    min_visibility: f32,
) -> Option<f64> {
    let points = chain
        .landmarks(side)
        .into_iter()
        .map(|lm| frame.visible(lm, min_visibility))
        .collect::<Option<Vec<_>>>()?;

    match chain {
        JointChain::ArmElevation => {
            let (shoulder, elbow, wrist, hip) = (points[0], points[1], points[2], points[3]);
            let elbow_angle = joint_angle(shoulder, elbow, wrist);
            let elevation = joint_angle(hip, shoulder, elbow);
            Some(elbow_angle.min(elevation))
        }
        JointChain::KneeExtension => {
            let (hip, knee, ankle) = (points[0], points[1], points[2]);
            Some(joint_angle(hip, knee, ankle))
        }
    }
}
