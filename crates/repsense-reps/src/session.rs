//! Per-stream analysis pipeline.
//!
//! A session starts in the detection phase: it averages classifier features
//! over a warm-up window while a [`MultiExerciseSelector`] offers a running
//! provisional guess. Once the window fills, the classifier's label is looked
//! up in the catalog and a single [`RepetitionCounter`] is locked in for the
//! rest of the stream.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use repsense_core::{EngineConfig, FeatureVector, FrameIndex, PoseFrame, Result, SessionId};
use serde::{Deserialize, Serialize};

use crate::classifier::ExerciseClassifier;
use crate::counter::RepetitionCounter;
use crate::selector::MultiExerciseSelector;
use crate::summary::{ExerciseSummarizer, Summary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Collecting warm-up features, exercise not yet known
    Detecting,
    /// Exercise locked in, counting reps
    Tracking,
}

/// Live state after one frame, consumed by overlay rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame_index: FrameIndex,
    pub phase: SessionPhase,
    /// Whether the frame carried a pose detection
    pub detected: bool,
    pub exercise: Option<String>,
    /// Selector's best guess while still detecting
    pub provisional_exercise: Option<String>,
    pub rep_count: u32,
    /// `None` when the tracked angle could not be measured this frame
    pub angle: Option<f64>,
    /// A rep completed on this frame
    pub rep_counted: bool,
}

/// A completed rep and the frame it completed on (drives audio cues)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepCue {
    pub frame_index: FrameIndex,
    pub rep: u32,
}

/// Final payload handed to report generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: SessionId,
    pub exercise: Option<String>,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub frames_processed: u64,
    pub summary: Option<Summary>,
    pub cues: Vec<RepCue>,
}

impl SessionReport {
    pub fn total_reps(&self) -> u32 {
        self.summary.as_ref().map_or(0, |s| s.total_reps)
    }

    pub fn form_score(&self) -> i64 {
        self.summary.as_ref().map_or(0, |s| s.form_score)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Detection + tracking pipeline for one video or stream
pub struct WorkoutSession {
    id: SessionId,
    config: EngineConfig,
    classifier: Arc<dyn ExerciseClassifier>,
    summarizer: ExerciseSummarizer,
    selector: MultiExerciseSelector,
    warmup: Vec<FeatureVector>,
    exercise: Option<String>,
    counter: Option<RepetitionCounter>,
    cues: Vec<RepCue>,
    frames_processed: u64,
}

impl WorkoutSession {
    pub fn new(config: EngineConfig, classifier: Arc<dyn ExerciseClassifier>) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            id: SessionId::new(),
            summarizer: ExerciseSummarizer::new(config.summary.clone()),
            selector: MultiExerciseSelector::from_catalog(&config.exercises),
            warmup: Vec::with_capacity(config.warmup_frames),
            config,
            classifier,
            exercise: None,
            counter: None,
            cues: Vec::new(),
            frames_processed: 0,
        })
    }

    /// Skip detection and track `label` from the first frame
    pub fn with_exercise(mut self, label: &str) -> Result<Self> {
        self.lock_in(label.to_string())?;
        Ok(self)
    }

    /// Feed one frame; `None` means the pose source found nobody.
    ///
    /// Fails only when the classifier names an exercise missing from the
    /// catalog or the classifier itself fails; per-frame joint dropouts are
    /// absorbed.
    pub fn process_frame(
        &mut self,
        frame_index: FrameIndex,
        frame: Option<&PoseFrame>,
    ) -> Result<FrameReport> {
        self.frames_processed += 1;

        let Some(frame) = frame else {
            return Ok(self.report_for(frame_index, false, None, None, false));
        };

        let mut provisional = None;
        if self.counter.is_none() {
            provisional = self.selector.update(frame).best_exercise;
            self.collect_warmup(frame)?;
        }

        let Some(counter) = self.counter.as_mut() else {
            return Ok(self.report_for(frame_index, true, provisional, None, false));
        };

        let update = counter.update(frame);
        let rep_counted = counter.rep_just_counted();
        if rep_counted {
            self.cues.push(RepCue {
                frame_index,
                rep: update.rep_count,
            });
        }

        Ok(self.report_for(frame_index, true, provisional, update.angle, rep_counted))
    }

    fn collect_warmup(&mut self, frame: &PoseFrame) -> Result<()> {
        match FeatureVector::from_frame(frame) {
            Ok(features) => self.warmup.push(features),
            Err(e) => tracing::debug!("Warm-up frame skipped: {}", e),
        }

        if self.warmup.len() < self.config.warmup_frames {
            return Ok(());
        }

        let features = FeatureVector::mean(&self.warmup)?;
        let label = self.classifier.predict(&features)?;
        tracing::debug!("Classifier features {:?} -> {}", features.to_array(), label);
        self.lock_in(label)
    }

    fn lock_in(&mut self, label: String) -> Result<()> {
        let exercise = self.config.exercises.get(&label)?;
        tracing::info!(
            "Session {} detected exercise {} ({}, {:.0}-{:.0} deg)",
            self.id,
            label,
            exercise.joint_triplet,
            exercise.angle_range.low(),
            exercise.angle_range.high()
        );

        self.counter = Some(RepetitionCounter::from_config(exercise));
        self.exercise = Some(label);
        Ok(())
    }

    fn report_for(
        &self,
        frame_index: FrameIndex,
        detected: bool,
        provisional_exercise: Option<String>,
        angle: Option<f64>,
        rep_counted: bool,
    ) -> FrameReport {
        FrameReport {
            frame_index,
            phase: self.phase(),
            detected,
            exercise: self.exercise.clone(),
            provisional_exercise,
            rep_count: self.rep_count(),
            angle,
            rep_counted,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        if self.counter.is_some() {
            SessionPhase::Tracking
        } else {
            SessionPhase::Detecting
        }
    }

    pub fn exercise(&self) -> Option<&str> {
        self.exercise.as_deref()
    }

    pub fn rep_count(&self) -> u32 {
        self.counter.as_ref().map_or(0, RepetitionCounter::rep_count)
    }

    pub fn counter(&self) -> Option<&RepetitionCounter> {
        self.counter.as_ref()
    }

    pub fn selector(&self) -> &MultiExerciseSelector {
        &self.selector
    }

    pub fn cues(&self) -> &[RepCue] {
        &self.cues
    }

    pub fn summary(&self) -> Option<Summary> {
        self.counter.as_ref().map(|c| self.summarizer.summarize(c))
    }

    /// Snapshot report without ending the session
    pub fn report(&self, source: &str) -> SessionReport {
        SessionReport {
            session_id: self.id,
            exercise: self.exercise.clone(),
            source: source.to_string(),
            generated_at: Utc::now(),
            frames_processed: self.frames_processed,
            summary: self.summary(),
            cues: self.cues.clone(),
        }
    }

    pub fn finish(self, source: &str) -> SessionReport {
        let report = self.report(source);
        match &report.exercise {
            Some(exercise) => tracing::info!(
                "Session {} finished: {} reps of {}, form {}%",
                self.id,
                report.total_reps(),
                exercise,
                report.form_score()
            ),
            None => tracing::warn!(
                "Session {} finished after {} frames without detecting an exercise",
                self.id,
                self.frames_processed
            ),
        }
        report
    }
}
