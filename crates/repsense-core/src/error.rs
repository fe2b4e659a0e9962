//! Error types for the repsense system.

use thiserror::Error;

use crate::types::Joint;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Missing joint in frame: {joint}")]
    MissingJoint { joint: Joint },

    #[error("Unknown exercise label: {0}")]
    UnknownExercise(String),

    #[error("Invalid angle range: low {low} must be below high {high}")]
    InvalidAngleRange { low: f64, high: f64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Unknown session: {0}")]
    UnknownSession(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
