//! Joint-angle geometry.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Joint, JointTriplet, Point2D, PoseFrame};

/// Guards the cosine denominator against zero-length limb vectors
pub const ANGLE_EPSILON: f64 = 1e-6;

/// Interior angle at vertex `b` of the polyline a-b-c, in degrees within [0, 180].
///
/// Overlapping keypoints never fail: the epsilon keeps the cosine finite and
/// the clamp keeps `acos` inside its domain.
pub fn joint_angle(a: Point2D, b: Point2D, c: Point2D) -> f64 {
    let ba: Vector2<f64> = a.to_nalgebra() - b.to_nalgebra();
    let bc: Vector2<f64> = c.to_nalgebra() - b.to_nalgebra();

    let cosine = ba.dot(&bc) / (ba.norm() * bc.norm() + ANGLE_EPSILON);
    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Resolve `triplet` in `frame` and measure the angle at its vertex
pub fn triplet_angle(frame: &PoseFrame, triplet: &JointTriplet) -> Result<f64> {
    let [a, b, c] = frame.resolve(triplet)?;
    Ok(joint_angle(a, b, c))
}

/// Joint angles fed to the exercise classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub elbow: f64,
    pub knee: f64,
    pub shoulder: f64,
}

impl FeatureVector {
    pub const ELBOW: JointTriplet =
        JointTriplet([Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist]);
    pub const KNEE: JointTriplet = JointTriplet([Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle]);
    pub const SHOULDER: JointTriplet =
        JointTriplet([Joint::LeftElbow, Joint::LeftShoulder, Joint::LeftHip]);

    pub fn new(elbow: f64, knee: f64, shoulder: f64) -> Self {
        Self {
            elbow,
            knee,
            shoulder,
        }
    }

    /// Measure all three feature angles; fails if any feature joint is missing
    pub fn from_frame(frame: &PoseFrame) -> Result<Self> {
        Ok(Self {
            elbow: triplet_angle(frame, &Self::ELBOW)?,
            knee: triplet_angle(frame, &Self::KNEE)?,
            shoulder: triplet_angle(frame, &Self::SHOULDER)?,
        })
    }

    /// Component-wise mean over a detection window
    pub fn mean(samples: &[FeatureVector]) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let n = samples.len() as f64;
        let (elbow, knee, shoulder) = samples.iter().fold((0.0, 0.0, 0.0), |acc, s| {
            (acc.0 + s.elbow, acc.1 + s.knee, acc.2 + s.shoulder)
        });

        Ok(Self::new(elbow / n, knee / n, shoulder / n))
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.elbow, self.knee, self.shoulder]
    }

    /// Euclidean distance in angle space
    pub fn distance_to(&self, other: &Self) -> f64 {
        let a = nalgebra::Vector3::from(self.to_array());
        let b = nalgebra::Vector3::from(other.to_array());
        (a - b).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_collinear_is_straight() {
        let angle = joint_angle(p(0.0, 0.0), p(50.0, 0.0), p(100.0, 0.0));
        assert!((angle - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_perpendicular_is_right_angle() {
        let angle = joint_angle(p(0.0, 1.0), p(0.0, 0.0), p(1.0, 0.0));
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_folded_is_zero() {
        let angle = joint_angle(p(2.0, 0.0), p(0.0, 0.0), p(1.0, 0.0));
        assert!(angle < 0.1);
    }

    #[test]
    fn test_degenerate_points_are_finite() {
        let b = p(3.0, 4.0);
        for angle in [
            joint_angle(b, b, p(5.0, 5.0)),
            joint_angle(p(5.0, 5.0), b, b),
            joint_angle(b, b, b),
            joint_angle(p(3.0 + 1e-12, 4.0), b, p(1.0, 1.0)),
        ] {
            assert!(angle.is_finite());
            assert!((0.0..=180.0).contains(&angle));
        }
    }

    #[test]
    fn test_angle_bounded_for_arbitrary_points() {
        let coords = [-250.0, -3.5, 0.0, 0.25, 7.0, 640.0];
        for &ax in &coords {
            for &cy in &coords {
                for &bx in &coords {
                    let angle = joint_angle(p(ax, 1.0), p(bx, -2.0), p(3.0, cy));
                    assert!((0.0..=180.0).contains(&angle), "angle {angle} out of range");
                }
            }
        }
    }

    #[test]
    fn test_feature_vector_from_frame() {
        let frame = PoseFrame::new()
            .with(Joint::LeftShoulder, p(0.0, 0.0))
            .with(Joint::LeftElbow, p(0.0, 1.0))
            .with(Joint::LeftWrist, p(1.0, 1.0))
            .with(Joint::LeftHip, p(0.0, -1.0))
            .with(Joint::LeftKnee, p(0.0, -2.0))
            .with(Joint::LeftAnkle, p(0.0, -3.0));

        let features = FeatureVector::from_frame(&frame).unwrap();
        assert!((features.elbow - 90.0).abs() < 1e-6);
        assert!((features.knee - 180.0).abs() < 0.1);
        assert!((features.shoulder - 180.0).abs() < 0.1);
    }

    #[test]
    fn test_feature_mean() {
        let mean = FeatureVector::mean(&[
            FeatureVector::new(10.0, 100.0, 40.0),
            FeatureVector::new(30.0, 120.0, 60.0),
        ])
        .unwrap();
        assert_eq!(mean, FeatureVector::new(20.0, 110.0, 50.0));
        assert!(FeatureVector::mean(&[]).is_err());
    }
}
