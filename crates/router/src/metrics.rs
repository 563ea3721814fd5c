//! Router metrics for observability

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::DestinationId;
use observability::{RunningStats, StatsSummary};
use parking_lot::Mutex;

/// Counters for one destination
#[derive(Debug, Default)]
pub struct DestinationMetrics {
    /// Predicate evaluations
    evaluated: AtomicU64,
    /// Events handed to the destination
    forwarded: AtomicU64,
    /// Evaluations that failed and were forwarded anyway
    fail_open: AtomicU64,
    /// Destination rejected the event
    failures: AtomicU64,
}

impl DestinationMetrics {
    pub fn evaluated(&self) -> u64 {
        self.evaluated.load(Ordering::Relaxed)
    }

    pub fn inc_evaluated(&self) {
        self.evaluated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn inc_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fail_open(&self) -> u64 {
        self.fail_open.load(Ordering::Relaxed)
    }

    pub fn inc_fail_open(&self) {
        self.fail_open.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn inc_failures(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DestinationSnapshot {
        DestinationSnapshot {
            evaluated: self.evaluated(),
            forwarded: self.forwarded(),
            fail_open: self.fail_open(),
            failures: self.failures(),
        }
    }
}

/// Metrics for one router instance
#[derive(Debug, Default)]
pub struct RouterMetrics {
    a: DestinationMetrics,
    b: DestinationMetrics,
    reconfigurations: AtomicU64,
    compile_failures: AtomicU64,
    abandoned: AtomicU64,
    dropped_after_close: AtomicU64,
    reconfiguration_ms: Mutex<RunningStats>,
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn destination(&self, destination: DestinationId) -> &DestinationMetrics {
        match destination {
            DestinationId::A => &self.a,
            DestinationId::B => &self.b,
        }
    }

    /// Record one completed reconfiguration and how long it took
    pub fn record_reconfiguration(&self, elapsed: Duration) {
        self.reconfigurations.fetch_add(1, Ordering::Relaxed);
        self.reconfiguration_ms
            .lock()
            .push(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn inc_compile_failures(&self) {
        self.compile_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped_after_close(&self) {
        self.dropped_after_close.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            a: self.a.snapshot(),
            b: self.b.snapshot(),
            reconfigurations: self.reconfigurations.load(Ordering::Relaxed),
            compile_failures: self.compile_failures.load(Ordering::Relaxed),
            abandoned_reconfigurations: self.abandoned.load(Ordering::Relaxed),
            dropped_after_close: self.dropped_after_close.load(Ordering::Relaxed),
            reconfiguration_ms: self.reconfiguration_ms.lock().summary(),
        }
    }
}

/// Snapshot of destination counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestinationSnapshot {
    pub evaluated: u64,
    pub forwarded: u64,
    pub fail_open: u64,
    pub failures: u64,
}

/// Snapshot of router metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct RouterMetricsSnapshot {
    pub a: DestinationSnapshot,
    pub b: DestinationSnapshot,
    pub reconfigurations: u64,
    pub compile_failures: u64,
    pub abandoned_reconfigurations: u64,
    pub dropped_after_close: u64,
    pub reconfiguration_ms: StatsSummary,
}

impl RouterMetricsSnapshot {
    pub fn destination(&self, destination: DestinationId) -> DestinationSnapshot {
        match destination {
            DestinationId::A => self.a,
            DestinationId::B => self.b,
        }
    }
}

impl fmt::Display for RouterMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Router Summary ===")?;
        for destination in DestinationId::BOTH {
            let d = self.destination(destination);
            writeln!(
                f,
                "{destination}: evaluated={}, forwarded={}, fail-open={}, failures={}",
                d.evaluated, d.forwarded, d.fail_open, d.failures
            )?;
        }
        writeln!(
            f,
            "Reconfigurations: {} (compile failures: {}, abandoned: {})",
            self.reconfigurations, self.compile_failures, self.abandoned_reconfigurations
        )?;
        writeln!(f, "Reconfiguration time (ms): {}", self.reconfiguration_ms)?;
        if self.dropped_after_close > 0 {
            writeln!(f, "Dropped after close: {}", self.dropped_after_close)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_per_destination() {
        let metrics = RouterMetrics::new();
        metrics.destination(DestinationId::A).inc_evaluated();
        metrics.destination(DestinationId::A).inc_forwarded();
        metrics.destination(DestinationId::B).inc_evaluated();
        metrics.destination(DestinationId::B).inc_fail_open();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.a.forwarded, 1);
        assert_eq!(snapshot.b.forwarded, 0);
        assert_eq!(snapshot.b.fail_open, 1);
    }

    #[test]
    fn test_summary_display() {
        let metrics = RouterMetrics::new();
        metrics.record_reconfiguration(Duration::from_millis(2));
        metrics.inc_compile_failures();

        let output = metrics.snapshot().to_string();
        assert!(output.contains("sink A: evaluated=0"));
        assert!(output.contains("Reconfigurations: 1 (compile failures: 1, abandoned: 0)"));
        assert!(output.contains("(n=1)"));
    }
}
