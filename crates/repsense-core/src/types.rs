//! Fundamental types for the repsense system.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use nalgebra::Point2;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Unique identifier for an analysis session (one video or live stream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Zero-based position of a frame within its source
pub type FrameIndex = u64;

/// 33-landmark body model (MediaPipe Pose order); a superset of COCO-17
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Joint {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Joint {
    pub const COUNT: usize = 33;

    pub const ALL: [Joint; Joint::COUNT] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    /// The 17 COCO keypoints, in COCO index order
    pub const COCO: [Joint; 17] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Landmark at a MediaPipe Pose index
    pub fn from_index(idx: u8) -> Option<Self> {
        Self::ALL.get(idx as usize).copied()
    }

    /// Keypoint at a COCO-17 index
    pub fn from_coco_index(idx: u8) -> Option<Self> {
        Self::COCO.get(idx as usize).copied()
    }

    /// Landmark name as emitted by pose estimators, e.g. `left_shoulder`
    pub fn name(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEyeInner => "left_eye_inner",
            Joint::LeftEye => "left_eye",
            Joint::LeftEyeOuter => "left_eye_outer",
            Joint::RightEyeInner => "right_eye_inner",
            Joint::RightEye => "right_eye",
            Joint::RightEyeOuter => "right_eye_outer",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::MouthLeft => "mouth_left",
            Joint::MouthRight => "mouth_right",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftPinky => "left_pinky",
            Joint::RightPinky => "right_pinky",
            Joint::LeftIndex => "left_index",
            Joint::RightIndex => "right_index",
            Joint::LeftThumb => "left_thumb",
            Joint::RightThumb => "right_thumb",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
            Joint::LeftHeel => "left_heel",
            Joint::RightHeel => "right_heel",
            Joint::LeftFootIndex => "left_foot_index",
            Joint::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Joint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|j| j.name() == needle)
            .ok_or_else(|| Error::Config(format!("unknown joint name: {s}")))
    }
}

/// 2D keypoint position, pixel or normalized units (consistent within a session)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn to_nalgebra(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    pub fn from_nalgebra(p: Point2<f64>) -> Self {
        Self::new(p.x, p.y)
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.to_nalgebra() - other.to_nalgebra()).norm()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Three joints defining the angle of interest; the middle joint is the vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JointTriplet(pub [Joint; 3]);

impl JointTriplet {
    pub fn new(a: Joint, vertex: Joint, c: Joint) -> Self {
        Self([a, vertex, c])
    }

    pub fn vertex(&self) -> Joint {
        self.0[1]
    }

    pub fn joints(&self) -> &[Joint; 3] {
        &self.0
    }
}

impl fmt::Display for JointTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Contracted (`low`) and extended (`high`) thresholds of a rep cycle, degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAngleRange")]
pub struct AngleRange {
    low: f64,
    high: f64,
}

#[derive(Deserialize)]
struct RawAngleRange {
    low: f64,
    high: f64,
}

impl TryFrom<RawAngleRange> for AngleRange {
    type Error = Error;

    fn try_from(raw: RawAngleRange) -> Result<Self> {
        AngleRange::new(raw.low, raw.high)
    }
}

impl AngleRange {
    pub fn new(low: f64, high: f64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(Error::InvalidAngleRange { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Expected range of motion, `high - low`
    pub fn span(&self) -> f64 {
        self.high - self.low
    }

    /// Inclusive on both bounds
    pub fn contains(&self, angle: f64) -> bool {
        self.low <= angle && angle <= self.high
    }
}

/// Half of the rep cycle currently active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// No contraction observed yet
    #[default]
    Idle,
    /// Contracted position reached
    Down,
    /// Extended position reached after a contraction
    Up,
}

/// Keypoints detected in a single frame.
///
/// Deserializes from a `name -> point` map; landmark names outside [`Joint`]
/// are dropped rather than failing the whole frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PoseFrame {
    keypoints: HashMap<Joint, Point2D>,
}

impl PoseFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, joint: Joint, point: Point2D) -> Self {
        self.insert(joint, point);
        self
    }

    pub fn insert(&mut self, joint: Joint, point: Point2D) {
        self.keypoints.insert(joint, point);
    }

    pub fn remove(&mut self, joint: Joint) -> Option<Point2D> {
        self.keypoints.remove(&joint)
    }

    pub fn get(&self, joint: Joint) -> Option<Point2D> {
        self.keypoints.get(&joint).copied()
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    /// Look up the triplet's points in triplet order.
    ///
    /// Fails with [`Error::MissingJoint`] naming the first absent joint.
    pub fn resolve(&self, triplet: &JointTriplet) -> Result<[Point2D; 3]> {
        let [a, b, c] = triplet.0;
        let lookup = |joint: Joint| self.get(joint).ok_or(Error::MissingJoint { joint });
        Ok([lookup(a)?, lookup(b)?, lookup(c)?])
    }
}

impl FromIterator<(Joint, Point2D)> for PoseFrame {
    fn from_iter<I: IntoIterator<Item = (Joint, Point2D)>>(iter: I) -> Self {
        Self {
            keypoints: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for PoseFrame {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = HashMap::<String, Point2D>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(name, point)| match name.parse::<Joint>() {
                Ok(joint) => Some((joint, point)),
                Err(_) => {
                    tracing::trace!("Dropping unknown landmark {}", name);
                    None
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_roundtrip() {
        for i in 0..Joint::COUNT as u8 {
            let joint = Joint::from_index(i).unwrap();
            assert_eq!(joint as u8, i);
            assert_eq!(joint.name().parse::<Joint>().unwrap(), joint);
        }
        assert!(Joint::from_index(33).is_none());
    }

    #[test]
    fn test_coco_indices() {
        assert_eq!(Joint::from_coco_index(0), Some(Joint::Nose));
        assert_eq!(Joint::from_coco_index(5), Some(Joint::LeftShoulder));
        assert_eq!(Joint::from_coco_index(16), Some(Joint::RightAnkle));
        assert!(Joint::from_coco_index(17).is_none());
    }

    #[test]
    fn test_frame_keeps_known_landmarks_and_drops_unknown() {
        let json = r#"{
            "left_heel": {"x": 10.0, "y": 20.0},
            "left_knee": {"x": 11.0, "y": 5.0},
            "left_foot_index": {"x": 15.0, "y": 21.0},
            "left_toe_tip": {"x": 16.0, "y": 22.0}
        }"#;
        let frame: PoseFrame = serde_json::from_str(json).unwrap();

        assert_eq!(frame.len(), 3);
        assert_eq!(frame.get(Joint::LeftHeel), Some(Point2D::new(10.0, 20.0)));
        assert_eq!(frame.get(Joint::LeftFootIndex), Some(Point2D::new(15.0, 21.0)));
    }

    #[test]
    fn test_triplet_with_foot_landmarks() {
        let triplet: JointTriplet =
            serde_json::from_str(r#"["left_knee","left_ankle","left_foot_index"]"#).unwrap();
        assert_eq!(triplet.vertex(), Joint::LeftAnkle);
        assert_eq!(triplet.0[2], Joint::LeftFootIndex);
    }

    #[test]
    fn test_joint_serializes_snake_case() {
        let json = serde_json::to_string(&Joint::LeftShoulder).unwrap();
        assert_eq!(json, "\"left_shoulder\"");
    }

    #[test]
    fn test_angle_range_rejects_inverted_bounds() {
        assert!(AngleRange::new(160.0, 60.0).is_err());
        assert!(AngleRange::new(60.0, 60.0).is_err());
        assert!(AngleRange::new(f64::NAN, 60.0).is_err());

        let range = AngleRange::new(60.0, 160.0).unwrap();
        assert_eq!(range.span(), 100.0);
        assert!(range.contains(60.0));
        assert!(range.contains(160.0));
        assert!(!range.contains(160.5));
    }

    #[test]
    fn test_angle_range_deserialization_validates() {
        let ok: AngleRange = serde_json::from_str(r#"{"low": 50, "high": 160}"#).unwrap();
        assert_eq!(ok.low(), 50.0);
        assert!(serde_json::from_str::<AngleRange>(r#"{"low": 170, "high": 160}"#).is_err());
    }

    #[test]
    fn test_triplet_serializes_as_array() {
        let triplet = JointTriplet::new(Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle);
        let json = serde_json::to_string(&triplet).unwrap();
        assert_eq!(json, r#"["left_hip","left_knee","left_ankle"]"#);
        assert_eq!(triplet.vertex(), Joint::LeftKnee);
    }

    #[test]
    fn test_resolve_reports_first_missing_joint() {
        let triplet = JointTriplet::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist);
        let frame = PoseFrame::new()
            .with(Joint::LeftShoulder, Point2D::new(0.0, 0.0))
            .with(Joint::LeftWrist, Point2D::new(1.0, 1.0));

        assert_eq!(
            frame.resolve(&triplet),
            Err(Error::MissingJoint {
                joint: Joint::LeftElbow
            })
        );
    }

    #[test]
    fn test_point_distance() {
        let p1 = Point2D::origin();
        let p2 = Point2D::new(3.0, 4.0);
        assert!((p1.distance_to(&p2) - 5.0).abs() < 1e-10);
    }
}
