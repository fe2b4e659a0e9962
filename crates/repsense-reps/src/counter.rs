//! Angle-threshold repetition counter.
//!
//! One counter watches one joint triplet. Each frame's vertex angle drives a
//! two-threshold state machine:
//!
//! - angle <= `low` while not already DOWN: enter DOWN, log the angle as a
//!   contraction
//! - angle >= `high` while DOWN: enter UP and count one rep
//! - anything else: no transition
//!
//! The band strictly between the thresholds never changes state, so jitter
//! around a single threshold cannot double count.

use repsense_core::{joint_angle, AngleRange, ExerciseConfig, JointTriplet, PoseFrame, Stage};
use serde::{Deserialize, Serialize};

/// One completed DOWN→UP cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepRecord {
    /// 1-based rep number
    pub index: u32,
    /// Angle logged when the contraction was entered
    pub min_angle: f64,
    /// Angle logged when the extension completed the rep
    pub max_angle: f64,
}

impl RepRecord {
    pub fn range_of_motion(&self) -> f64 {
        self.max_angle - self.min_angle
    }
}

/// Result of a single [`RepetitionCounter::update`] call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepUpdate {
    pub rep_count: u32,
    /// `None` when the frame could not be measured
    pub angle: Option<f64>,
    pub ok: bool,
}

/// Per-exercise repetition state machine
#[derive(Debug, Clone)]
pub struct RepetitionCounter {
    joint_triplet: JointTriplet,
    angle_range: AngleRange,
    stage: Stage,
    rep_count: u32,
    rep_just_counted: bool,
    angle_history: Vec<f64>,
    min_angles: Vec<f64>,
    pending_min: Option<f64>,
    reps: Vec<RepRecord>,
}

impl RepetitionCounter {
    pub fn new(joint_triplet: JointTriplet, angle_range: AngleRange) -> Self {
        Self {
            joint_triplet,
            angle_range,
            stage: Stage::Idle,
            rep_count: 0,
            rep_just_counted: false,
            angle_history: Vec::new(),
            min_angles: Vec::new(),
            pending_min: None,
            reps: Vec::new(),
        }
    }

    pub fn from_config(config: &ExerciseConfig) -> Self {
        Self::new(config.joint_triplet, config.angle_range)
    }

    /// Measure the triplet in `frame` and advance the state machine.
    ///
    /// A frame missing any triplet joint is skipped: the result carries
    /// `ok = false` and no state (including `rep_just_counted`) changes.
    pub fn update(&mut self, frame: &PoseFrame) -> RepUpdate {
        match frame.resolve(&self.joint_triplet) {
            Ok([a, b, c]) => self.update_angle(joint_angle(a, b, c)),
            Err(e) => {
                tracing::debug!("Skipping frame for {}: {}", self.joint_triplet, e);
                RepUpdate {
                    rep_count: self.rep_count,
                    angle: None,
                    ok: false,
                }
            }
        }
    }

    /// Advance the state machine with an already measured angle
    pub fn update_angle(&mut self, angle: f64) -> RepUpdate {
        self.angle_history.push(angle);
        self.rep_just_counted = false;

        if angle <= self.angle_range.low() {
            if self.stage != Stage::Down {
                self.stage = Stage::Down;
                self.min_angles.push(angle);
                self.pending_min = Some(angle);
            }
        } else if angle >= self.angle_range.high() && self.stage == Stage::Down {
            self.stage = Stage::Up;
            self.rep_count += 1;
            self.rep_just_counted = true;

            // DOWN is only ever entered through the branch above
            let min_angle = self.pending_min.take().unwrap_or(angle);
            self.reps.push(RepRecord {
                index: self.rep_count,
                min_angle,
                max_angle: angle,
            });

            tracing::info!(
                "Rep counted: {} ({}), angle {:.2}",
                self.rep_count,
                self.joint_triplet,
                angle
            );
        }

        RepUpdate {
            rep_count: self.rep_count,
            angle: Some(angle),
            ok: true,
        }
    }

    pub fn joint_triplet(&self) -> &JointTriplet {
        &self.joint_triplet
    }

    pub fn angle_range(&self) -> &AngleRange {
        &self.angle_range
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// True only for the update that completed a rep; cleared by the next update
    pub fn rep_just_counted(&self) -> bool {
        self.rep_just_counted
    }

    /// Every angle measured so far, in arrival order
    pub fn angle_history(&self) -> &[f64] {
        &self.angle_history
    }

    /// Angle logged at each transition into DOWN
    pub fn min_angles(&self) -> &[f64] {
        &self.min_angles
    }

    /// Angle logged at each completed rep; always `rep_count` long
    pub fn max_angles(&self) -> Vec<f64> {
        self.reps.iter().map(|r| r.max_angle).collect()
    }

    pub fn rep_records(&self) -> &[RepRecord] {
        &self.reps
    }

    /// Forget all history and start a fresh set
    pub fn reset(&mut self) {
        *self = Self::new(self.joint_triplet, self.angle_range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repsense_core::{Joint, Point2D};

    fn curl_counter() -> RepetitionCounter {
        RepetitionCounter::new(
            JointTriplet::new(Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
            AngleRange::new(60.0, 160.0).unwrap(),
        )
    }

    /// Arm frame whose elbow angle is `degrees`
    fn arm_at(degrees: f64) -> PoseFrame {
        let rad = degrees.to_radians();
        PoseFrame::new()
            .with(Joint::LeftShoulder, Point2D::new(100.0, 0.0))
            .with(Joint::LeftElbow, Point2D::new(0.0, 0.0))
            .with(Joint::LeftWrist, Point2D::new(100.0 * rad.cos(), 100.0 * rad.sin()))
    }

    #[test]
    fn test_reference_sequence() {
        let mut counter = curl_counter();
        for angle in [170.0, 55.0, 165.0, 58.0, 162.0, 50.0, 168.0] {
            counter.update_angle(angle);
        }

        assert_eq!(counter.rep_count(), 3);
        assert_eq!(counter.min_angles(), &[55.0, 58.0, 50.0]);
        assert_eq!(counter.max_angles(), vec![165.0, 162.0, 168.0]);
        assert_eq!(counter.stage(), Stage::Up);
        assert_eq!(counter.angle_history().len(), 7);
    }

    #[test]
    fn test_extension_without_contraction_never_counts() {
        let mut counter = curl_counter();
        for angle in [170.0, 100.0, 165.0, 175.0] {
            counter.update_angle(angle);
        }
        assert_eq!(counter.rep_count(), 0);
        assert_eq!(counter.stage(), Stage::Idle);
        assert!(counter.min_angles().is_empty());
    }

    #[test]
    fn test_hysteresis_band_holds_stage() {
        let mut counter = curl_counter();
        counter.update_angle(50.0);
        for angle in [61.0, 59.0, 100.0, 40.0, 159.9] {
            counter.update_angle(angle);
        }

        assert_eq!(counter.stage(), Stage::Down);
        assert_eq!(counter.min_angles(), &[50.0]);
        assert_eq!(counter.rep_count(), 0);
    }

    #[test]
    fn test_threshold_oscillation_counts_once_per_pair() {
        let mut counter = curl_counter();
        let mut expected = 0;
        for cycle in 0..5 {
            counter.update_angle(60.0);
            counter.update_angle(60.0);
            counter.update_angle(160.0);
            counter.update_angle(160.0);
            expected += 1;
            assert_eq!(counter.rep_count(), expected, "cycle {cycle}");
        }
        assert_eq!(counter.max_angles().len(), counter.rep_count() as usize);
    }

    #[test]
    fn test_rep_count_is_monotonic() {
        let mut counter = curl_counter();
        let mut last = 0;
        for i in 0..500 {
            let angle = 110.0 + 70.0 * (i as f64 * 0.37).sin() + (i % 7) as f64;
            let update = counter.update_angle(angle);
            assert!(update.rep_count >= last);
            last = update.rep_count;

            assert_eq!(counter.max_angles().len(), counter.rep_count() as usize);
            assert!(counter.min_angles().len() >= counter.max_angles().len());
        }
    }

    #[test]
    fn test_rep_just_counted_is_one_shot() {
        let mut counter = curl_counter();
        counter.update_angle(50.0);
        assert!(!counter.rep_just_counted());

        counter.update_angle(170.0);
        assert!(counter.rep_just_counted());

        counter.update_angle(170.0);
        assert!(!counter.rep_just_counted());
    }

    #[test]
    fn test_update_from_frame() {
        let mut counter = curl_counter();
        let down = counter.update(&arm_at(45.0));
        assert!(down.ok);
        assert!((down.angle.unwrap() - 45.0).abs() < 1e-3);
        assert_eq!(counter.stage(), Stage::Down);

        let up = counter.update(&arm_at(170.0));
        assert_eq!(up.rep_count, 1);
        assert!(counter.rep_just_counted());
    }

    #[test]
    fn test_missing_joint_leaves_state_unchanged() {
        let mut counter = curl_counter();
        counter.update_angle(50.0);
        counter.update_angle(170.0);
        assert!(counter.rep_just_counted());

        let mut frame = arm_at(40.0);
        frame.remove(Joint::LeftWrist);
        let update = counter.update(&frame);

        assert_eq!(
            update,
            RepUpdate {
                rep_count: 1,
                angle: None,
                ok: false
            }
        );
        assert_eq!(counter.stage(), Stage::Up);
        assert_eq!(counter.angle_history(), &[50.0, 170.0]);
        assert_eq!(counter.min_angles(), &[50.0]);
        assert_eq!(counter.max_angles(), vec![170.0]);
    }

    #[test]
    fn test_rep_records_pair_contraction_and_extension() {
        let mut counter = curl_counter();
        for angle in [55.0, 30.0, 165.0, 58.0, 70.0, 170.0] {
            counter.update_angle(angle);
        }

        let records = counter.rep_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].index, 1);
        assert_eq!(records[0].min_angle, 55.0);
        assert_eq!(records[0].max_angle, 165.0);
        assert_eq!(records[1].range_of_motion(), 112.0);
    }

    #[test]
    fn test_reset() {
        let mut counter = curl_counter();
        counter.update_angle(50.0);
        counter.update_angle(170.0);
        counter.reset();

        assert_eq!(counter.rep_count(), 0);
        assert_eq!(counter.stage(), Stage::Idle);
        assert!(counter.angle_history().is_empty());
        assert!(counter.rep_records().is_empty());
    }
}
