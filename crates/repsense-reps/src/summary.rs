//! Set summaries: rep totals, average angles, form score and per-rep logs.
//!
//! ## Form score
//!
//! score = round((avg_max - avg_min) / (high - low) * 100)
//!
//! i.e. the observed mean range of motion as a percentage of the calibrated
//! range. It is reported as 0 until `min_reps_for_score` reps exist and may
//! exceed 100 unless `clamp_form_score` is set.

use repsense_core::{AngleRange, Result, SummaryConfig};
use serde::{Deserialize, Serialize};

use crate::counter::RepetitionCounter;

/// Diagnostics for one repetition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepLog {
    /// 1-based rep number
    pub rep: u32,
    /// `None` when no contraction was logged for this rep
    pub min_angle: Option<f64>,
    /// `None` when no extension was logged for this rep
    pub max_angle: Option<f64>,
    pub correct: bool,
}

/// Immutable snapshot of a set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_reps: u32,
    pub correct_reps: u32,
    pub incorrect_reps: u32,
    pub avg_min_angle: f64,
    pub avg_max_angle: f64,
    pub form_score: i64,
    pub rep_logs: Vec<RepLog>,
}

impl Summary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn description(&self) -> &'static str {
        if self.total_reps == 0 {
            "No repetitions detected"
        } else if self.form_score >= 90 {
            "Full range of motion"
        } else if self.form_score >= 70 {
            "Mostly full range of motion"
        } else if self.form_score > 0 {
            "Partial range of motion"
        } else {
            "Not enough repetitions to score"
        }
    }
}

/// Angle lists recorded as two parallel sequences, e.g. imported from a log.
///
/// Unlike a live counter these may be misaligned: a rep can lack its
/// contraction angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepHistory {
    pub angle_range: AngleRange,
    pub rep_count: u32,
    pub min_angles: Vec<f64>,
    pub max_angles: Vec<f64>,
}

impl From<&RepetitionCounter> for RepHistory {
    fn from(counter: &RepetitionCounter) -> Self {
        Self {
            angle_range: *counter.angle_range(),
            rep_count: counter.rep_count(),
            min_angles: counter.min_angles().to_vec(),
            max_angles: counter.max_angles(),
        }
    }
}

/// Derives [`Summary`] values without touching the counter
#[derive(Debug, Clone, Default)]
pub struct ExerciseSummarizer {
    config: SummaryConfig,
}

impl ExerciseSummarizer {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    pub fn summarize(&self, counter: &RepetitionCounter) -> Summary {
        let range = counter.angle_range();
        let rep_logs = counter
            .rep_records()
            .iter()
            .map(|record| RepLog {
                rep: record.index,
                min_angle: Some(record.min_angle),
                max_angle: Some(record.max_angle),
                correct: self.is_correct(record.range_of_motion(), range),
            })
            .collect();

        self.build(
            counter.rep_count(),
            range,
            counter.min_angles(),
            &counter.max_angles(),
            rep_logs,
        )
    }

    /// Summarize parallel angle lists, substituting placeholders where a rep
    /// has no matching entry. Such reps are never correct.
    pub fn summarize_history(&self, history: &RepHistory) -> Summary {
        let range = &history.angle_range;
        let rep_logs = (0..history.rep_count as usize)
            .map(|i| {
                let min_angle = history.min_angles.get(i).copied();
                let max_angle = history.max_angles.get(i).copied();
                let correct = match (min_angle, max_angle) {
                    (Some(min), Some(max)) => self.is_correct(max - min, range),
                    _ => false,
                };
                RepLog {
                    rep: i as u32 + 1,
                    min_angle,
                    max_angle,
                    correct,
                }
            })
            .collect::<Vec<_>>();

        let anomalies = rep_logs
            .iter()
            .filter(|log| log.min_angle.is_none() || log.max_angle.is_none())
            .count();
        if anomalies > 0 {
            tracing::warn!("{} rep(s) have no paired min/max angle", anomalies);
        }

        self.build(
            history.rep_count,
            range,
            &history.min_angles,
            &history.max_angles,
            rep_logs,
        )
    }

    fn is_correct(&self, range_of_motion: f64, range: &AngleRange) -> bool {
        range_of_motion >= range.span() * self.config.correctness_ratio
    }

    fn build(
        &self,
        total_reps: u32,
        range: &AngleRange,
        min_angles: &[f64],
        max_angles: &[f64],
        rep_logs: Vec<RepLog>,
    ) -> Summary {
        let avg_min_angle = mean_2dp(min_angles);
        let avg_max_angle = mean_2dp(max_angles);

        let form_score = if total_reps < self.config.min_reps_for_score {
            0
        } else {
            let score = ((avg_max_angle - avg_min_angle) / range.span() * 100.0).round() as i64;
            if self.config.clamp_form_score {
                score.clamp(0, 100)
            } else {
                score
            }
        };

        let correct_reps = rep_logs.iter().filter(|log| log.correct).count() as u32;

        Summary {
            total_reps,
            correct_reps,
            incorrect_reps: total_reps.saturating_sub(correct_reps),
            avg_min_angle,
            avg_max_angle,
            form_score,
            rep_logs,
        }
    }
}

/// Arithmetic mean rounded to two decimals; 0 for an empty slice
fn mean_2dp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (mean * 100.0).round() / 100.0
}
