use crate::error::PostureResult;
use cu29_clock::RobotClock;
use cu_posture_payloads::FrameResult;

/// A producer of landmark snapshots: a camera plus pose estimator, a replay, a feed from another thread...
///
/// The analysis worker calls `start` once, then `next` every cycle, then `stop` once when it exits.
/// `next` may block as long as it needs; consecutive frames must carry strictly increasing timestamps.
/// An error from `next` is terminal for the loop.
pub trait LandmarkSource: Send + 'static {
    fn start(&mut self, _clock: &RobotClock) -> PostureResult<()> {
        Ok(())
    }

    fn next(&mut self, clock: &RobotClock) -> PostureResult<FrameResult>;

    /// Releases the underlying resources.
    fn stop(&mut self, _clock: &RobotClock) -> PostureResult<()> {
        Ok(())
    }
}

impl<S: LandmarkSource + ?Sized> LandmarkSource for Box<S> {
    fn start(&mut self, clock: &RobotClock) -> PostureResult<()> {
        (**self).start(clock)
    }

    fn next(&mut self, clock: &RobotClock) -> PostureResult<FrameResult> {
        (**self).next(clock)
    }

    fn stop(&mut self, clock: &RobotClock) -> PostureResult<()> {
        (**self).stop(clock)
    }
}
