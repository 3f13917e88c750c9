//! Exercise catalog: what each prescribed exercise measures and what counts
//! as a correct repetition.

use physio_core::{Error, PoseFrame, PoseLandmark, Result, Side, ValueRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed set of supported exercises
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    ArmRaiseForward,
    LegExtension,
    TrunkSway,
    NeckTilt,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::ArmRaiseForward,
        ExerciseKind::LegExtension,
        ExerciseKind::TrunkSway,
        ExerciseKind::NeckTilt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::ArmRaiseForward => "arm-raise-forward",
            ExerciseKind::LegExtension => "leg-extension",
            ExerciseKind::TrunkSway => "trunk-sway",
            ExerciseKind::NeckTilt => "neck-tilt",
        }
    }

    /// Stable numeric id used by session storage
    pub fn database_id(&self) -> u32 {
        match self {
            ExerciseKind::ArmRaiseForward => 1,
            ExerciseKind::LegExtension => 2,
            ExerciseKind::TrunkSway => 3,
            ExerciseKind::NeckTilt => 4,
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownExercise(s.to_string()))
    }
}

/// Physical unit of a measured value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Joint angle in degrees, `[0, 180]`
    Degrees,
    /// Horizontal distance in thousandths of the frame width
    OffsetThousandths,
}

impl Unit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Degrees => "°",
            Unit::OffsetThousandths => "‰",
        }
    }
}

/// Three-landmark chain whose middle joint angle is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointChain {
    /// Smaller of the elbow angle (shoulder-elbow-wrist) and the shoulder
    /// elevation (hip-shoulder-elbow)
    ArmElevation,
    /// Knee angle (hip-knee-ankle)
    KneeExtension,
}

impl JointChain {
    /// Landmarks needed to measure one side
    pub fn landmarks(&self, side: Side) -> Vec<PoseLandmark> {
        use PoseLandmark::*;
        let pick = |l, r| PoseLandmark::for_side(side, l, r);
        match self {
            JointChain::ArmElevation => vec![
                pick(LeftShoulder, RightShoulder),
                pick(LeftElbow, RightElbow),
                pick(LeftWrist, RightWrist),
                pick(LeftHip, RightHip),
            ],
            JointChain::KneeExtension => vec![
                pick(LeftHip, RightHip),
                pick(LeftKnee, RightKnee),
                pick(LeftAnkle, RightAnkle),
            ],
        }
    }

    /// Landmark at the end of the moving limb
    pub fn distal(&self, side: Side) -> PoseLandmark {
        match self {
            JointChain::ArmElevation => {
                PoseLandmark::for_side(side, PoseLandmark::LeftWrist, PoseLandmark::RightWrist)
            }
            JointChain::KneeExtension => {
                PoseLandmark::for_side(side, PoseLandmark::LeftAnkle, PoseLandmark::RightAnkle)
            }
        }
    }
}

/// Body region a head offset is judged against. Both measure the nose
/// against the shoulder midpoint; they differ in which extra landmarks must
/// be visible for the pose to count as detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetReference {
    /// Whole-trunk sway, hips must be in frame
    Torso,
    /// Head tilt, ears must be in frame
    Neck,
}

/// What an exercise measures each frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Measurement {
    /// Joint angle in degrees
    JointAngle { chain: JointChain },
    /// Horizontal nose offset from the shoulder midpoint, `|dx| * scale`.
    /// With `scale = 1000` the value is in thousandths of the frame width.
    HeadOffset { reference: OffsetReference, scale: f64 },
}

impl Measurement {
    pub const OFFSET_SCALE: f64 = 1000.0;

    pub fn unit(&self) -> Unit {
        match self {
            Measurement::JointAngle { .. } => Unit::Degrees,
            Measurement::HeadOffset { .. } => Unit::OffsetThousandths,
        }
    }

    /// Landmarks that must be visible before a value can be produced.
    ///
    /// Alternating joint exercises only require the active side; otherwise
    /// both sides are required.
    pub fn required_landmarks(&self, active_side: Side, alternating: bool) -> Vec<PoseLandmark> {
        use PoseLandmark::*;
        match self {
            Measurement::JointAngle { chain } => {
                if alternating {
                    chain.landmarks(active_side)
                } else {
                    let mut both = chain.landmarks(Side::Left);
                    both.extend(chain.landmarks(Side::Right));
                    both
                }
            }
            Measurement::HeadOffset { reference, .. } => match reference {
                OffsetReference::Torso => {
                    vec![Nose, LeftShoulder, RightShoulder, LeftHip, RightHip]
                }
                OffsetReference::Neck => vec![Nose, LeftEar, RightEar, LeftShoulder, RightShoulder],
            },
        }
    }

    /// Landmark whose trajectory is watched for tremor
    pub fn tracked_landmark(&self, active_side: Side) -> PoseLandmark {
        match self {
            Measurement::JointAngle { chain } => chain.distal(active_side),
            Measurement::HeadOffset { .. } => PoseLandmark::Nose,
        }
    }
}

/// Static description of one prescribed exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub kind: ExerciseKind,
    pub name: String,
    pub description: String,
    pub measurement: Measurement,
    /// Range that counts as correct
    pub target: ValueRange,
    /// Range that counts as back at the starting position
    pub rest: ValueRange,
    /// Visibility every required landmark must exceed
    pub min_visibility: f32,
    /// Continuous time in target before a repetition counts
    pub hold_duration_ms: u64,
    /// Strict left/right turn-taking between repetitions
    pub alternating: bool,
    /// Relative importance of landmarks for the pose confidence score
    #[serde(default)]
    pub landmark_weights: Vec<(PoseLandmark, f32)>,
}

impl ExerciseDefinition {
    pub fn unit(&self) -> Unit {
        self.measurement.unit()
    }

    pub fn required_landmarks(&self, active_side: Side) -> Vec<PoseLandmark> {
        self.measurement
            .required_landmarks(active_side, self.alternating)
    }

    /// Weighted mean visibility of the weighted landmarks present in the frame
    pub fn weighted_visibility(&self, frame: &PoseFrame) -> f32 {
        let (sum, total) = self
            .landmark_weights
            .iter()
            .filter_map(|(lm, w)| frame.get(*lm).map(|l| (l.visibility * w, *w)))
            .fold((0.0f32, 0.0f32), |(s, t), (v, w)| (s + v, t + w));

        if total > 0.0 {
            sum / total
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidDefinition {
            id: self.kind.to_string(),
            reason: reason.to_string(),
        };

        if !self.target.is_valid() {
            return Err(invalid("target range must satisfy min < max"));
        }
        if !self.rest.is_valid() {
            return Err(invalid("rest range must satisfy min < max"));
        }
        if self.target.overlaps(&self.rest) {
            return Err(invalid("target and rest ranges must not overlap"));
        }
        if !(0.0..=1.0).contains(&self.min_visibility) {
            return Err(invalid("minimum visibility must be within [0, 1]"));
        }
        if self.hold_duration_ms == 0 {
            return Err(invalid("hold duration must be positive"));
        }
        if let Measurement::HeadOffset { scale, .. } = self.measurement {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(invalid("offset scale must be positive"));
            }
        }
        if self.landmark_weights.iter().any(|(_, w)| *w < 0.0) {
            return Err(invalid("landmark weights must be non-negative"));
        }
        Ok(())
    }
}

/// Validated set of exercise definitions keyed by exercise
#[derive(Debug, Clone)]
pub struct ExerciseCatalog {
    definitions: BTreeMap<ExerciseKind, ExerciseDefinition>,
}

impl ExerciseCatalog {
    /// Catalog with the built-in clinical defaults
    pub fn builtin() -> Self {
        use PoseLandmark::*;

        let definitions = [
            ExerciseDefinition {
                kind: ExerciseKind::ArmRaiseForward,
                name: "Arm Raise Forward".into(),
                description: "Raise each arm forward to shoulder height, alternating sides".into(),
                measurement: Measurement::JointAngle {
                    chain: JointChain::ArmElevation,
                },
                target: ValueRange::new(70.0, 100.0),
                rest: ValueRange::new(0.0, 30.0),
                min_visibility: 0.6,
                hold_duration_ms: 1000,
                alternating: true,
                landmark_weights: vec![
                    (LeftShoulder, 1.5),
                    (RightShoulder, 1.5),
                    (LeftElbow, 1.2),
                    (RightElbow, 1.2),
                    (LeftWrist, 1.0),
                    (RightWrist, 1.0),
                ],
            },
            ExerciseDefinition {
                kind: ExerciseKind::LegExtension,
                name: "Leg Extension".into(),
                description: "Straighten each knee from a seated position, alternating sides".into(),
                measurement: Measurement::JointAngle {
                    chain: JointChain::KneeExtension,
                },
                target: ValueRange::new(160.0, 180.0),
                rest: ValueRange::new(70.0, 110.0),
                min_visibility: 0.6,
                hold_duration_ms: 1000,
                alternating: true,
                landmark_weights: vec![
                    (LeftHip, 1.3),
                    (RightHip, 1.3),
                    (LeftKnee, 1.5),
                    (RightKnee, 1.5),
                    (LeftAnkle, 1.0),
                    (RightAnkle, 1.0),
                ],
            },
            ExerciseDefinition {
                kind: ExerciseKind::TrunkSway,
                name: "Trunk Sway".into(),
                description: "Sway the upper body to the left and right, alternating sides".into(),
                measurement: Measurement::HeadOffset {
                    reference: OffsetReference::Torso,
                    scale: Measurement::OFFSET_SCALE,
                },
                target: ValueRange::new(50.0, 500.0),
                rest: ValueRange::new(0.0, 30.0),
                min_visibility: 0.5,
                hold_duration_ms: 800,
                alternating: true,
                landmark_weights: vec![
                    (LeftShoulder, 1.5),
                    (RightShoulder, 1.5),
                    (LeftHip, 1.5),
                    (RightHip, 1.5),
                ],
            },
            ExerciseDefinition {
                kind: ExerciseKind::NeckTilt,
                name: "Neck Tilt".into(),
                description: "Tilt the head toward each shoulder, alternating sides".into(),
                measurement: Measurement::HeadOffset {
                    reference: OffsetReference::Neck,
                    scale: Measurement::OFFSET_SCALE,
                },
                target: ValueRange::new(50.0, 500.0),
                rest: ValueRange::new(0.0, 30.0),
                min_visibility: 0.4,
                hold_duration_ms: 800,
                alternating: true,
                landmark_weights: vec![
                    (LeftEar, 1.5),
                    (RightEar, 1.5),
                    (LeftShoulder, 1.2),
                    (RightShoulder, 1.2),
                ],
            },
        ];

        Self {
            definitions: definitions.into_iter().map(|d| (d.kind, d)).collect(),
        }
    }

    /// Built-in catalog with the given definitions replacing the defaults
    pub fn from_definitions(definitions: Vec<ExerciseDefinition>) -> Result<Self> {
        let mut catalog = Self::builtin();
        for definition in definitions {
            catalog.register(definition)?;
        }
        Ok(catalog)
    }

    /// Parse a JSON array of definitions over the built-in defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let definitions: Vec<ExerciseDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// Validate and install a definition, replacing any existing one
    pub fn register(&mut self, definition: ExerciseDefinition) -> Result<()> {
        definition.validate()?;
        self.definitions.insert(definition.kind, definition);
        Ok(())
    }

    pub fn get(&self, kind: ExerciseKind) -> Option<&ExerciseDefinition> {
        self.definitions.get(&kind)
    }

    /// Look up by exercise identifier, failing on unknown ids
    pub fn lookup(&self, id: &str) -> Result<&ExerciseDefinition> {
        let kind: ExerciseKind = id.parse()?;
        self.get(kind)
            .ok_or_else(|| Error::UnknownExercise(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for ExerciseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use physio_core::{Landmark, Timestamp};

    #[test]
    fn test_builtin_definitions_are_valid() {
        let catalog = ExerciseCatalog::builtin();
        assert_eq!(catalog.len(), 4);
        for definition in catalog.iter() {
            definition.validate().unwrap();
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = ExerciseCatalog::builtin();
        let leg = catalog.lookup("leg-extension").unwrap();
        assert_eq!(leg.kind, ExerciseKind::LegExtension);
        assert_eq!(leg.target, ValueRange::new(160.0, 180.0));
        assert_eq!(leg.rest, ValueRange::new(70.0, 110.0));
        assert_eq!(leg.hold_duration_ms, 1000);
        assert_eq!(leg.unit(), Unit::Degrees);
    }

    #[test]
    fn test_unknown_exercise_fails() {
        let catalog = ExerciseCatalog::builtin();
        let err = catalog.lookup("shoulder-abduction").unwrap_err();
        assert!(matches!(err, Error::UnknownExercise(id) if id == "shoulder-abduction"));
    }

    #[test]
    fn test_kind_string_roundtrip() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_register_rejects_overlapping_ranges() {
        let mut catalog = ExerciseCatalog::builtin();
        let mut definition = catalog.lookup("arm-raise-forward").unwrap().clone();
        definition.rest = ValueRange::new(0.0, 80.0);
        let err = catalog.register(definition).unwrap_err();
        assert!(matches!(err, Error::InvalidDefinition { .. }));
    }

    #[test]
    fn test_register_replaces_definition() {
        let mut catalog = ExerciseCatalog::builtin();
        let mut definition = catalog.lookup("leg-extension").unwrap().clone();
        definition.hold_duration_ms = 2000;
        catalog.register(definition).unwrap();
        assert_eq!(catalog.lookup("leg-extension").unwrap().hold_duration_ms, 2000);
    }

    #[test]
    fn test_from_json_overrides() {
        let mut definition = ExerciseCatalog::builtin()
            .lookup("neck-tilt")
            .unwrap()
            .clone();
        definition.min_visibility = 0.7;
        let json = serde_json::to_string(&vec![definition]).unwrap();

        let catalog = ExerciseCatalog::from_json(&json).unwrap();
        assert_eq!(catalog.lookup("neck-tilt").unwrap().min_visibility, 0.7);
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_required_landmarks() {
        let catalog = ExerciseCatalog::builtin();
        let arm = catalog.lookup("arm-raise-forward").unwrap();
        assert_eq!(
            arm.required_landmarks(Side::Right),
            vec![
                PoseLandmark::RightShoulder,
                PoseLandmark::RightElbow,
                PoseLandmark::RightWrist,
                PoseLandmark::RightHip
            ]
        );

        let mut both = arm.clone();
        both.alternating = false;
        assert_eq!(both.required_landmarks(Side::Left).len(), 8);

        let neck = catalog.lookup("neck-tilt").unwrap();
        assert!(neck.required_landmarks(Side::Left).contains(&PoseLandmark::LeftEar));
    }

    #[test]
    fn test_weighted_visibility() {
        let catalog = ExerciseCatalog::builtin();
        let trunk = catalog.lookup("trunk-sway").unwrap();

        let mut frame = PoseFrame::empty(Timestamp::from_millis(0));
        frame.set(PoseLandmark::LeftShoulder, Landmark::new(0.4, 0.3, 1.0));
        frame.set(PoseLandmark::RightShoulder, Landmark::new(0.6, 0.3, 1.0));
        let confidence = trunk.weighted_visibility(&frame);
        assert!((confidence - 0.5).abs() < 1e-6);
    }
}
