//! Landmark sources feeding the posture analysis loop.
//!
//! - [`ReplaySource`] plays a [`Recording`] back, optionally in real time and in a loop.
//! - [`FeedSource`] receives the output of an estimator running on another thread through a [`LandmarkFeed`].
//! - [`SyntheticSession`] scripts a seated person going through the postures the classifier knows.

mod feed;
mod recording;
mod replay;
mod synthetic;

pub use feed::{landmark_feed, FeedSource, LandmarkFeed};
pub use recording::{Recording, RecordingError};
pub use replay::ReplaySource;
pub use synthetic::{PosturePhase, SyntheticSession};
