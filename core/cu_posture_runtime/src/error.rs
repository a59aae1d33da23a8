use crate::analysis::LoopState;
use cu_posture::{FeatureError, ThresholdError};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostureError {
    #[error("Landmark source failure: {0}")]
    Source(String),

    #[error("Landmark source exhausted")]
    SourceExhausted,

    #[error("Cannot {command} an analysis loop in state {from}")]
    InvalidTransition { from: LoopState, command: &'static str },

    #[error("Analysis worker still running {0:?} after the stop request")]
    ShutdownTimeout(Duration),

    #[error("Could not spawn a pipeline thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    #[error(transparent)]
    Feature(#[from] FeatureError),
}

impl PostureError {
    /// Wraps any error raised by a source implementation.
    pub fn source_failure(msg: &str, cause: impl std::fmt::Display) -> Self {
        PostureError::Source(format!("{msg}: {cause}"))
    }
}

pub type PostureResult<T> = Result<T, PostureError>;
