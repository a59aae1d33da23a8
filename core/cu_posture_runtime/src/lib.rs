//! Runtime of the posture pipeline.
//!
//! An [`AnalysisLoop`] owns a [`LandmarkSource`] and a dedicated worker thread. Every cycle the worker pulls
//! a [`FrameResult`](cu_posture_payloads::FrameResult), classifies it and publishes a
//! [`PostureSignal`](cu_posture_payloads::PostureSignal) through a latest-value [`SignalFanout`].
//! Consumers never hold the worker back: each one reads its own slot at its own pace.

mod analysis;
mod config;
mod consumer;
mod error;
mod fanout;
mod monitoring;
mod source;

pub use analysis::{AnalysisHandle, AnalysisLoop, LoopState};
pub use config::{read_configuration, AnalysisConfig};
pub use consumer::{
    spawn_consumer, spawn_preview_consumer, ConsumerHandle, PostureConsumer, PreviewConsumer,
};
pub use error::{PostureError, PostureResult};
pub use fanout::{RecvTimeoutError, SignalFanout, SignalReceiver};
pub use monitoring::{LoopStats, LoopStatsSnapshot};
pub use source::LandmarkSource;
