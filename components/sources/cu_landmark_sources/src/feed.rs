//! Bridge for an estimator running on its own thread: it pushes results into a [`LandmarkFeed`], the
//! analysis loop pulls them from the matching [`FeedSource`].

use cu29_clock::RobotClock;
use cu_posture_payloads::{FrameResult, PoseLandmarks};
use cu_posture_runtime::{LandmarkSource, PostureError, PostureResult};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

/// Creates a connected feed / source pair.
/// `capacity` frames can be queued before [`LandmarkFeed::push`] blocks.
pub fn landmark_feed(capacity: usize, poll_interval: Duration) -> (LandmarkFeed, FeedSource) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (
        LandmarkFeed { tx },
        FeedSource {
            rx,
            poll_interval,
        },
    )
}

#[derive(Clone)]
pub struct LandmarkFeed {
    tx: SyncSender<FrameResult>,
}

impl LandmarkFeed {
    /// Queues a frame, blocking while the queue is full.
    pub fn push(&self, frame: FrameResult) -> PostureResult<()> {
        self.tx
            .send(frame)
            .map_err(|e| PostureError::source_failure("Landmark feed closed", e))
    }

    /// Queues a frame unless the queue is full. Returns whether it was queued.
    pub fn try_push(&self, frame: FrameResult) -> PostureResult<bool> {
        match self.tx.try_send(frame) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(e @ TrySendError::Disconnected(_)) => {
                Err(PostureError::source_failure("Landmark feed closed", e))
            }
        }
    }

    /// Stamps an estimator output with the clock and queues it.
    pub fn push_detection(&self, clock: &RobotClock, landmarks: Option<PoseLandmarks>) -> PostureResult<()> {
        let timestamp = clock.now();
        let frame = match landmarks {
            Some(landmarks) => FrameResult::FramePose {
                timestamp,
                landmarks,
            },
            None => FrameResult::FrameNoPose { timestamp },
        };
        self.push(frame)
    }
}

pub struct FeedSource {
    rx: Receiver<FrameResult>,
    poll_interval: Duration,
}

impl LandmarkSource for FeedSource {
    fn next(&mut self, _clock: &RobotClock) -> PostureResult<FrameResult> {
        match self.rx.recv_timeout(self.poll_interval) {
            Ok(frame) => Ok(frame),
            Err(RecvTimeoutError::Timeout) => Ok(FrameResult::NoFrame),
            Err(RecvTimeoutError::Disconnected) => Err(PostureError::SourceExhausted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cu29_clock::CuDuration;

    #[test]
    fn test_feed_delivers_in_order() {
        let (clock, mock) = RobotClock::mock();
        let (feed, mut source) = landmark_feed(4, Duration::from_millis(10));
        mock.set_value(5);
        feed.push_detection(&clock, None).unwrap();
        mock.set_value(9);
        feed.push_detection(&clock, Some(PoseLandmarks::default())).unwrap();

        assert_eq!(
            source.next(&clock).unwrap(),
            FrameResult::FrameNoPose {
                timestamp: CuDuration(5)
            }
        );
        assert_eq!(source.next(&clock).unwrap().timestamp(), Some(CuDuration(9)));
    }

    #[test]
    fn test_silence_is_no_frame() {
        let (clock, _mock) = RobotClock::mock();
        let (_feed, mut source) = landmark_feed(1, Duration::from_millis(5));
        assert_eq!(source.next(&clock).unwrap(), FrameResult::NoFrame);
    }

    #[test]
    fn test_full_queue_and_hang_ups() {
        let (clock, _mock) = RobotClock::mock();
        let (feed, mut source) = landmark_feed(1, Duration::from_millis(5));
        assert!(feed.try_push(FrameResult::NoFrame).unwrap());
        assert!(!feed.try_push(FrameResult::NoFrame).unwrap());

        drop(feed);
        // queued frames are still delivered
        assert_eq!(source.next(&clock).unwrap(), FrameResult::NoFrame);
        assert!(matches!(source.next(&clock), Err(PostureError::SourceExhausted)));

        let (feed, source) = landmark_feed(1, Duration::from_millis(5));
        drop(source);
        assert!(feed.push(FrameResult::NoFrame).is_err());
    }
}
