//! Deterministic synthetic keypoint streams.
//!
//! Produces a standing figure performing curls: the left elbow angle follows
//! `center + amplitude * sin(frame / period)` while every other joint stays
//! put. Useful for exercising the pipeline without a pose estimator.

use repsense_core::{Joint, Point2D, PoseFrame};

/// Sinusoidal bicep-curl generator, pixel units
#[derive(Debug, Clone, Copy)]
pub struct SyntheticCurl {
    pub center: f64,
    pub amplitude: f64,
    /// Frames per radian of the sine
    pub period: f64,
    pub limb_length: f64,
}

impl Default for SyntheticCurl {
    fn default() -> Self {
        Self {
            center: 110.0,
            amplitude: 60.0,
            period: 15.0,
            limb_length: 100.0,
        }
    }
}

impl SyntheticCurl {
    /// Target elbow angle in degrees at `frame_index`
    pub fn angle_at(&self, frame_index: u64) -> f64 {
        self.center + self.amplitude * (frame_index as f64 / self.period).sin()
    }

    pub fn frame(&self, frame_index: u64) -> PoseFrame {
        let l = self.limb_length;
        let shoulder = Point2D::new(320.0, 200.0);
        let elbow = Point2D::new(320.0, 200.0 + l);

        // The upper arm points straight up from the elbow (-90 degrees in
        // image coordinates); rotate the forearm away from it by the target.
        let heading = (self.angle_at(frame_index) - 90.0).to_radians();
        let wrist = Point2D::new(elbow.x + l * heading.cos(), elbow.y + l * heading.sin());

        PoseFrame::new()
            .with(Joint::LeftShoulder, shoulder)
            .with(Joint::LeftElbow, elbow)
            .with(Joint::LeftWrist, wrist)
            .with(Joint::LeftHip, Point2D::new(330.0, 200.0 + 2.0 * l))
            .with(Joint::LeftKnee, Point2D::new(330.0, 200.0 + 3.2 * l))
            .with(Joint::LeftAnkle, Point2D::new(330.0, 200.0 + 4.4 * l))
    }

    pub fn frames(&self, count: u64) -> impl Iterator<Item = PoseFrame> + '_ {
        (0..count).map(move |i| self.frame(i))
    }
}
