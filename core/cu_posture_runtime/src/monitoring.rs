//! Counters the analysis worker keeps about itself.

use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct LoopStats {
    cycles: AtomicU64,
    published: AtomicU64,
    no_frame: AtomicU64,
    no_pose: AtomicU64,
    stale: AtomicU64,
    calibrations: AtomicU64,
}

impl LoopStats {
    pub(crate) fn cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn no_frame(&self) {
        self.no_frame.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn no_pose(&self) {
        self.no_pose.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn calibrated(&self) {
        self.calibrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LoopStatsSnapshot {
        LoopStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            no_frame: self.no_frame.load(Ordering::Relaxed),
            no_pose: self.no_pose.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            calibrations: self.calibrations.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoopStatsSnapshot {
    pub cycles: u64,
    pub published: u64,
    pub no_frame: u64,
    pub no_pose: u64,
    pub stale: u64,
    pub calibrations: u64,
}

impl Display for LoopStatsSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cycles: {} published: {} no frame: {} no pose: {} stale: {} calibrations: {}",
            self.cycles, self.published, self.no_frame, self.no_pose, self.stale, self.calibrations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let stats = LoopStats::default();
        stats.cycle();
        stats.cycle();
        stats.no_frame();
        stats.published();
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cycles, 2);
        assert_eq!(snapshot.no_frame, 1);
        assert_eq!(snapshot.published, 1);
        assert_eq!(snapshot.stale, 0);
    }
}
