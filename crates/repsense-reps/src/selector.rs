//! Heuristic exercise disambiguation.
//!
//! Every candidate exercise gets its own [`RepetitionCounter`]. Each frame,
//! every candidate whose triplet resolves logs an observation; candidates
//! whose angle also lies inside their calibrated range feed their counter and
//! compete on
//!
//! confidence = rep count + observations so far
//!
//! The highest confidence wins; ties keep the earlier candidate.

use repsense_core::{triplet_angle, ExerciseCatalog, ExerciseConfig, PoseFrame};
use serde::{Deserialize, Serialize};

use crate::counter::RepetitionCounter;

/// Best candidate for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub best_exercise: Option<String>,
    pub angle: Option<f64>,
    pub rep_count: u32,
}

impl Selection {
    fn none() -> Self {
        Self {
            best_exercise: None,
            angle: None,
            rep_count: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Candidate {
    label: String,
    counter: RepetitionCounter,
    observations: Vec<f64>,
}

impl Candidate {
    fn confidence(&self) -> usize {
        self.counter.rep_count() as usize + self.observations.len()
    }
}

/// Runs one counter per known exercise against the same frames
#[derive(Debug, Clone)]
pub struct MultiExerciseSelector {
    candidates: Vec<Candidate>,
}

impl MultiExerciseSelector {
    pub fn new<'a>(configs: impl IntoIterator<Item = &'a ExerciseConfig>) -> Self {
        Self {
            candidates: configs
                .into_iter()
                .map(|config| Candidate {
                    label: config.label.clone(),
                    counter: RepetitionCounter::from_config(config),
                    observations: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn from_catalog(catalog: &ExerciseCatalog) -> Self {
        Self::new(catalog.iter())
    }

    pub fn update(&mut self, frame: &PoseFrame) -> Selection {
        let mut best: Option<(usize, usize, f64)> = None;

        for (idx, candidate) in self.candidates.iter_mut().enumerate() {
            let angle = match triplet_angle(frame, candidate.counter.joint_triplet()) {
                Ok(angle) => angle,
                Err(e) => {
                    tracing::trace!("Candidate {} skipped: {}", candidate.label, e);
                    continue;
                }
            };
            candidate.observations.push(angle);

            if !candidate.counter.angle_range().contains(angle) {
                continue;
            }
            candidate.counter.update_angle(angle);

            let score = candidate.confidence();
            if best.map_or(true, |(_, best_score, _)| score > best_score) {
                best = Some((idx, score, angle));
            }
        }

        match best {
            Some((idx, _, angle)) => {
                let candidate = &self.candidates[idx];
                Selection {
                    best_exercise: Some(candidate.label.clone()),
                    angle: Some(angle),
                    rep_count: candidate.counter.rep_count(),
                }
            }
            None => Selection::none(),
        }
    }

    /// Rep count plus observation count; `None` for an unknown label
    pub fn confidence(&self, label: &str) -> Option<usize> {
        self.candidate(label).map(Candidate::confidence)
    }

    pub fn observations(&self, label: &str) -> Option<&[f64]> {
        self.candidate(label).map(|c| c.observations.as_slice())
    }

    pub fn counter(&self, label: &str) -> Option<&RepetitionCounter> {
        self.candidate(label).map(|c| &c.counter)
    }

    /// Label with the highest confidence so far, earliest on ties
    pub fn leader(&self) -> Option<&str> {
        let mut best: Option<&Candidate> = None;
        for candidate in &self.candidates {
            if best.map_or(true, |b| candidate.confidence() > b.confidence()) {
                best = Some(candidate);
            }
        }
        best.filter(|c| c.confidence() > 0).map(|c| c.label.as_str())
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.label.as_str())
    }

    fn candidate(&self, label: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.label == label)
    }
}
