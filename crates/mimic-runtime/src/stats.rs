//! Cycle statistics for the control loop.
//!
//! Every periodic task in the source system carries interval statistics; the
//! equivalent here is a small set of atomic counters the scheduler thread
//! updates once per cycle and any other thread can snapshot at any time
//! through [`LoopStats`].  No locks, no allocation on the cycle path.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Shared counters
// ─────────────────────────────────────────────────────────────────────────────

/// Atomic counters shared between the scheduler thread and loop handles.
pub(crate) struct SharedStats {
    cycles: AtomicU64,
    overruns: AtomicU64,
    sink_errors: AtomicU64,
    last_cycle_ns: AtomicU64,
    max_cycle_ns: AtomicU64,
}

impl SharedStats {
    pub(crate) const fn new() -> Self {
        Self {
            cycles: AtomicU64::new(0),
            overruns: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            last_cycle_ns: AtomicU64::new(0),
            max_cycle_ns: AtomicU64::new(0),
        }
    }

    /// Record one completed cycle of the given duration.
    pub(crate) fn record_cycle(&self, duration_ns: u64) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ns.store(duration_ns, Ordering::Relaxed);
        self.max_cycle_ns.fetch_max(duration_ns, Ordering::Relaxed);
    }

    /// Record a missed deadline and return the new overrun total.
    pub(crate) fn record_overrun(&self) -> u64 {
        self.overruns.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Record a rejected sink delivery.
    pub(crate) fn record_sink_error(&self) {
        self.sink_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub(crate) fn snapshot(&self) -> LoopStats {
        LoopStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            last_cycle_ns: self.last_cycle_ns.load(Ordering::Relaxed),
            max_cycle_ns: self.max_cycle_ns.load(Ordering::Relaxed),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Point-in-time statistics snapshot of a control loop.
///
/// Obtained from [`ControlLoop::stats`][crate::scheduler::ControlLoop::stats]
/// or [`LoopHandle::stats`][crate::scheduler::LoopHandle::stats].  Overruns
/// and sink errors are observations, not faults: the loop keeps running
/// through both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Total control cycles completed.
    pub cycles: u64,
    /// Cycles whose body exceeded the configured period.
    pub overruns: u64,
    /// Commands the sink rejected.
    pub sink_errors: u64,
    /// Duration of the most recent cycle body, in nanoseconds.
    pub last_cycle_ns: u64,
    /// Duration of the slowest cycle body seen so far, in nanoseconds.
    pub max_cycle_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_stats_are_zeroed() {
        let stats = SharedStats::new();
        let snap = stats.snapshot();
        assert_eq!(snap.cycles, 0);
        assert_eq!(snap.overruns, 0);
        assert_eq!(snap.sink_errors, 0);
        assert_eq!(snap.last_cycle_ns, 0);
        assert_eq!(snap.max_cycle_ns, 0);
    }

    #[test]
    fn record_cycle_tracks_last_and_max() {
        let stats = SharedStats::new();
        stats.record_cycle(500_000);
        stats.record_cycle(900_000);
        stats.record_cycle(200_000);

        let snap = stats.snapshot();
        assert_eq!(snap.cycles, 3);
        assert_eq!(snap.last_cycle_ns, 200_000);
        assert_eq!(snap.max_cycle_ns, 900_000);
    }

    #[test]
    fn record_overrun_returns_running_total() {
        let stats = SharedStats::new();
        assert_eq!(stats.record_overrun(), 1);
        assert_eq!(stats.record_overrun(), 2);
        assert_eq!(stats.snapshot().overruns, 2);
    }

    #[test]
    fn sink_errors_accumulate() {
        let stats = SharedStats::new();
        stats.record_sink_error();
        stats.record_sink_error();
        assert_eq!(stats.snapshot().sink_errors, 2);
    }

    #[test]
    fn loop_stats_serialization_roundtrip() {
        let snap = LoopStats {
            cycles: 1000,
            overruns: 2,
            sink_errors: 1,
            last_cycle_ns: 150_000,
            max_cycle_ns: 2_100_000,
        };
        let json = serde_json::to_string(&snap).unwrap();
        let back: LoopStats = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, back);
    }
}
