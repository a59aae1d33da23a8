use crate::recording::Recording;
use cu29_clock::{CuDuration, CuTime, RobotClock};
use cu_posture_payloads::FrameResult;
use cu_posture_runtime::{LandmarkSource, PostureError, PostureResult};
use log::{debug, info};
use std::time::Duration;

/// Gap inserted between two passes when a recording has a single timestamped frame.
const DEFAULT_LOOP_GAP: CuDuration = CuDuration(33_000_000);

/// Plays a [`Recording`] back as a landmark source.
pub struct ReplaySource {
    recording: Recording,
    cursor: usize,
    realtime: bool,
    looping: bool,
    /// Added to every recorded timestamp, grows by one pass at each loop.
    offset: CuDuration,
    pass: CuDuration,
    /// Clock time matching the first recorded timestamp.
    anchor: Option<CuTime>,
}

impl ReplaySource {
    pub fn new(recording: Recording) -> Self {
        let timed = recording
            .frames
            .iter()
            .filter(|frame| frame.timestamp().is_some())
            .count() as u64;
        let span = recording.span();
        // keeps the recorded frame interval across the seam
        let gap = if timed > 1 {
            CuDuration(span.0 / (timed - 1))
        } else {
            DEFAULT_LOOP_GAP
        };
        Self {
            recording,
            cursor: 0,
            realtime: false,
            looping: false,
            offset: CuDuration(0),
            pass: span + gap,
            anchor: None,
        }
    }

    /// Paces the frames against the clock following the recorded timestamps.
    pub fn realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    /// Restarts from the beginning at the end instead of reporting exhaustion.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn remaining(&self) -> usize {
        self.recording.len() - self.cursor
    }

    fn wait_for(&self, clock: &RobotClock, timestamp: CuTime) {
        let (Some(anchor), Some(first)) = (self.anchor, self.recording.first_timestamp()) else {
            return;
        };
        let due = anchor.0 + timestamp.0.saturating_sub(first.0);
        let now = clock.now().0;
        if due > now {
            std::thread::sleep(Duration::from_nanos(due - now));
        }
    }
}

impl LandmarkSource for ReplaySource {
    fn start(&mut self, clock: &RobotClock) -> PostureResult<()> {
        info!(
            "Replaying {} frames over {}.",
            self.recording.len(),
            self.recording.span()
        );
        self.anchor = Some(clock.now());
        Ok(())
    }

    fn next(&mut self, clock: &RobotClock) -> PostureResult<FrameResult> {
        if self.cursor == self.recording.len() {
            if !self.looping || self.recording.is_empty() {
                return Err(PostureError::SourceExhausted);
            }
            self.cursor = 0;
            self.offset += self.pass;
            debug!("Replay looping, offset {}.", self.offset);
        }
        let frame = self.recording.frames[self.cursor].clone();
        self.cursor += 1;

        let Some(recorded) = frame.timestamp() else {
            return Ok(frame);
        };
        let timestamp = recorded + self.offset;
        if self.realtime {
            self.wait_for(clock, timestamp);
        }
        Ok(frame.with_timestamp(timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn no_pose(ms: u64) -> FrameResult {
        FrameResult::FrameNoPose {
            timestamp: CuDuration(ms * 1_000_000),
        }
    }

    fn timestamps(source: &mut ReplaySource, clock: &RobotClock, n: usize) -> Vec<Option<u64>> {
        (0..n)
            .map(|_| source.next(clock).unwrap().timestamp().map(|t| t.0 / 1_000_000))
            .collect()
    }

    #[test]
    fn test_plays_then_exhausts() {
        let (clock, _mock) = RobotClock::mock();
        let mut source = ReplaySource::new(Recording::new(vec![no_pose(0), FrameResult::NoFrame, no_pose(10)]));
        source.start(&clock).unwrap();
        assert_eq!(timestamps(&mut source, &clock, 3), vec![Some(0), None, Some(10)]);
        assert_eq!(source.remaining(), 0);
        assert!(matches!(source.next(&clock), Err(PostureError::SourceExhausted)));
    }

    #[test]
    fn test_looping_keeps_timestamps_increasing() {
        let (clock, _mock) = RobotClock::mock();
        let mut source =
            ReplaySource::new(Recording::new(vec![no_pose(0), no_pose(10), no_pose(20)])).looping(true);
        source.start(&clock).unwrap();
        assert_eq!(
            timestamps(&mut source, &clock, 7),
            vec![Some(0), Some(10), Some(20), Some(30), Some(40), Some(50), Some(60)]
        );
    }

    #[test]
    fn test_single_frame_loop() {
        let (clock, _mock) = RobotClock::mock();
        let mut source = ReplaySource::new(Recording::new(vec![no_pose(5)])).looping(true);
        source.start(&clock).unwrap();
        assert_eq!(timestamps(&mut source, &clock, 3), vec![Some(5), Some(38), Some(71)]);
    }

    #[test]
    fn test_empty_recording_is_exhausted_even_when_looping() {
        let (clock, _mock) = RobotClock::mock();
        let mut source = ReplaySource::new(Recording::default()).looping(true);
        assert!(matches!(source.next(&clock), Err(PostureError::SourceExhausted)));
    }

    #[test]
    fn test_realtime_pacing() {
        let clock = RobotClock::new();
        let mut source =
            ReplaySource::new(Recording::new(vec![no_pose(0), no_pose(30), no_pose(60)])).realtime(true);
        let started = Instant::now();
        source.start(&clock).unwrap();
        timestamps(&mut source, &clock, 3);
        assert!(started.elapsed() >= Duration::from_millis(55));
    }
}
