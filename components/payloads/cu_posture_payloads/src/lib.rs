//! Payloads exchanged along the posture pipeline:
//! landmark snapshots coming from the estimator, the per-frame features and the published posture status.

mod frame;
mod landmarks;
mod status;

pub use frame::{FrameResult, PreviewFrame};
pub use landmarks::*;
pub use status::{ClassificationResult, DisplayColor, FeatureSet, PostureSignal, StatusLabel};
