//! Exercise calibration table and engine configuration.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::FeatureVector;
use crate::types::{AngleRange, Joint, JointTriplet};

/// Calibration for one exercise: which angle to watch and its rep thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseConfig {
    pub label: String,
    pub joint_triplet: JointTriplet,
    pub angle_range: AngleRange,
}

impl ExerciseConfig {
    pub fn new(label: impl Into<String>, joint_triplet: JointTriplet, angle_range: AngleRange) -> Self {
        Self {
            label: label.into(),
            joint_triplet,
            angle_range,
        }
    }
}

/// Ordered mapping from exercise label to its calibration.
///
/// Order matters: the multi-exercise selector breaks score ties in favour of
/// the earlier entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExerciseCatalog {
    exercises: Vec<ExerciseConfig>,
}

impl ExerciseCatalog {
    pub fn new() -> Self {
        Self {
            exercises: Vec::new(),
        }
    }

    /// Add or replace the entry for `config.label`, keeping its position
    pub fn insert(&mut self, config: ExerciseConfig) {
        match self.exercises.iter_mut().find(|e| e.label == config.label) {
            Some(existing) => *existing = config,
            None => self.exercises.push(config),
        }
    }

    pub fn with(mut self, config: ExerciseConfig) -> Self {
        self.insert(config);
        self
    }

    /// Look up an exercise, failing with [`Error::UnknownExercise`]
    pub fn get(&self, label: &str) -> Result<&ExerciseConfig> {
        self.exercises
            .iter()
            .find(|e| e.label == label)
            .ok_or_else(|| Error::UnknownExercise(label.to_string()))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.exercises.iter().any(|e| e.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExerciseConfig> {
        self.exercises.iter()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.exercises.iter().map(|e| e.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl Default for ExerciseCatalog {
    fn default() -> Self {
        use Joint::*;

        let entry = |label: &str, triplet: [Joint; 3], low: f64, high: f64| ExerciseConfig {
            label: label.to_string(),
            joint_triplet: JointTriplet(triplet),
            angle_range: AngleRange::new(low, high).expect("built-in angle ranges are ordered"),
        };

        Self {
            exercises: vec![
                entry("bicep_curl", [LeftShoulder, LeftElbow, LeftWrist], 50.0, 160.0),
                entry("pull_up", [LeftShoulder, LeftElbow, LeftWrist], 15.0, 165.0),
                entry("squat", [LeftHip, LeftKnee, LeftAnkle], 60.0, 160.0),
                entry("shoulder_press", [LeftElbow, LeftShoulder, LeftHip], 70.0, 170.0),
                entry("trx_row", [LeftShoulder, LeftElbow, LeftHip], 60.0, 160.0),
            ],
        }
    }
}

/// Form scoring policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Below this many reps the form score is reported as 0
    pub min_reps_for_score: u32,
    /// Fraction of the expected range a single rep must cover to be correct
    pub correctness_ratio: f64,
    /// Clamp the form score into [0, 100]
    pub clamp_form_score: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            min_reps_for_score: 3,
            correctness_ratio: 0.8,
            clamp_form_score: false,
        }
    }
}

/// Mean feature vector of one exercise, used by the nearest-centroid classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCentroid {
    pub label: String,
    pub features: FeatureVector,
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frames averaged before the classifier is consulted
    pub warmup_frames: usize,

    /// Form scoring policy
    pub summary: SummaryConfig,

    /// Per-exercise calibration table
    pub exercises: ExerciseCatalog,

    /// Classifier centroids (optional)
    pub centroids: Vec<LabelCentroid>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 30,
            summary: SummaryConfig::default(),
            exercises: ExerciseCatalog::default(),
            centroids: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file, overridable by `REPSENSE__*` variables
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("REPSENSE").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("REPSENSE").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.warmup_frames == 0 {
            return Err(Error::Config("warmup_frames must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.summary.correctness_ratio) {
            return Err(Error::Config(format!(
                "correctness_ratio {} outside [0, 1]",
                self.summary.correctness_ratio
            )));
        }
        if self.exercises.is_empty() {
            return Err(Error::Config("exercise catalog is empty".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self.exercises.labels().find(|label| !seen.insert(*label)) {
            return Err(Error::Config(format!("duplicate exercise label: {duplicate}")));
        }
        if let Some(orphan) = self
            .centroids
            .iter()
            .find(|c| !self.exercises.contains(&c.label))
        {
            return Err(Error::UnknownExercise(orphan.label.clone()));
        }
        Ok(())
    }
}
