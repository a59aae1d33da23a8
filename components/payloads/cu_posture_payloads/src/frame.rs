use crate::landmarks::PoseLandmarks;
use bincode::{Decode, Encode};
use cu29_clock::CuTime;
use serde::{Deserialize, Serialize};

/// What a landmark source hands to the analysis loop on each pull.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub enum FrameResult {
    /// No new frame was available, nothing must be published for this cycle.
    NoFrame,
    /// A frame was captured but nobody is in it.
    FrameNoPose { timestamp: CuTime },
    /// A frame with exactly one detected person.
    FramePose {
        timestamp: CuTime,
        landmarks: PoseLandmarks,
    },
}

impl FrameResult {
    pub fn timestamp(&self) -> Option<CuTime> {
        match self {
            FrameResult::NoFrame => None,
            FrameResult::FrameNoPose { timestamp } => Some(*timestamp),
            FrameResult::FramePose { timestamp, .. } => Some(*timestamp),
        }
    }

    /// Same frame moved in time, used to stitch looping replays.
    pub fn with_timestamp(self, timestamp: CuTime) -> Self {
        match self {
            FrameResult::NoFrame => FrameResult::NoFrame,
            FrameResult::FrameNoPose { .. } => FrameResult::FrameNoPose { timestamp },
            FrameResult::FramePose { landmarks, .. } => FrameResult::FramePose {
                timestamp,
                landmarks,
            },
        }
    }
}

/// Hand-off to the preview renderer, independent of the classification.
#[derive(Debug, Clone, PartialEq, Encode, Decode, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub timestamp: CuTime,
    pub landmarks: Option<PoseLandmarks>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use cu29_clock::CuDuration;

    #[test]
    fn test_timestamps() {
        assert_eq!(FrameResult::NoFrame.timestamp(), None);
        let frame = FrameResult::FrameNoPose {
            timestamp: CuDuration(10),
        };
        assert_eq!(frame.timestamp(), Some(CuDuration(10)));
        let moved = frame.with_timestamp(CuDuration(42));
        assert_eq!(moved.timestamp(), Some(CuDuration(42)));
        assert_eq!(
            FrameResult::NoFrame.with_timestamp(CuDuration(42)),
            FrameResult::NoFrame
        );
    }
}
