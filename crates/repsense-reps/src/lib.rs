//! # Repsense-Reps
//!
//! Angle-based repetition detection and scoring.
//!
//! ## Pipeline
//!
//! 1. **Geometry**: each frame's joint triplet yields one vertex angle
//! 2. **Counting**: a two-threshold state machine turns the angle series into
//!    DOWN→UP rep events
//! 3. **Summary**: completed reps are reduced to totals, average angles, a
//!    form score and per-rep correctness
//!
//! While the exercise is still unknown, a [`MultiExerciseSelector`] runs one
//! counter per catalog entry and a [`WorkoutSession`] hands the averaged
//! warm-up features to an [`ExerciseClassifier`].
//!
//! ## Form Score
//!
//! score = round((mean max angle - mean min angle) / (high - low) * 100)
//!
//! A single rep is correct when its own range of motion reaches 80% of the
//! calibrated range.

pub mod classifier;
pub mod counter;
pub mod registry;
pub mod selector;
pub mod session;
pub mod summary;
pub mod synthetic;

pub use classifier::*;
pub use counter::*;
pub use registry::*;
pub use selector::*;
pub use session::*;
pub use summary::*;
pub use synthetic::*;
