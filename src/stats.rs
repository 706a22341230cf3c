use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Counters shared by every wrapper installed by one monitor.
#[derive(Debug, Default)]
pub struct MonitorStats {
    intercepted: AtomicU64,
    dispatched: AtomicU64,
    suppressed: AtomicU64,
    extractor_failures: AtomicU64,
    sink_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Calls whose original method returned and reached the pipeline.
    pub intercepted: u64,
    /// Records accepted by the sink.
    pub dispatched: u64,
    /// Calls whose extractor produced nothing to send.
    pub suppressed: u64,
    pub extractor_failures: u64,
    pub sink_failures: u64,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_intercepted(&self) {
        self.intercepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_extractor_failure(&self) {
        self.extractor_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            intercepted: self.intercepted.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            extractor_failures: self.extractor_failures.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}
