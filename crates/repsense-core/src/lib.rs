//! # Repsense-Core
//!
//! Core types and utilities for the repsense exercise analysis engine:
//! named body joints, 2D keypoint frames, joint-angle geometry and the
//! per-exercise calibration table.

pub mod error;
pub mod geometry;
pub mod settings;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use settings::*;
pub use types::*;
