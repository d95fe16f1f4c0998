//! Lock-Free Pipeline Metrics
//!
//! Cache-aligned atomic counters for zero-overhead performance tracking.
//! All counters use relaxed ordering; readers take a `snapshot()`.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cache-aligned wrapper for any type
///
/// Keeps hot counters written by different threads off each other's cache
/// lines.
#[repr(C, align(64))]
#[derive(Default)]
pub struct CacheAligned<T> {
    inner: T,
}

impl<T> CacheAligned<T> {
    pub const fn new(inner: T) -> Self {
        Self { inner }
    }

    #[inline(always)]
    pub fn get(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

/// Counters shared by every stage of the live pipeline
///
/// Each counter has a single writing thread: ingress counters are written by
/// the feed, the rest by the stage that owns them.
#[derive(Default)]
pub struct PipelineMetrics {
    /// Events accepted into the ingress ring
    pub events_ingested: CacheAligned<AtomicU64>,
    /// Events dropped because the ingress ring was full
    pub ingress_dropped: CacheAligned<AtomicU64>,
    /// Intensity updates performed
    pub intensity_updates: CacheAligned<AtomicU64>,
    /// Decisions produced
    pub decisions_made: CacheAligned<AtomicU64>,
    /// Cumulative decision-stage latency
    pub decision_latency_ns: CacheAligned<AtomicU64>,
    /// Records dropped between stage threads
    pub stage_dropped: CacheAligned<AtomicU64>,
    /// Orders handed to the egress ring
    pub orders_emitted: CacheAligned<AtomicU64>,
    /// Orders dropped because the egress ring was full
    pub egress_dropped: CacheAligned<AtomicU64>,
}

#[inline(always)]
fn bump(counter: &CacheAligned<AtomicU64>, by: u64) {
    counter.get().fetch_add(by, Ordering::Relaxed);
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn inc_ingested(&self) {
        bump(&self.events_ingested, 1);
    }

    #[inline(always)]
    pub fn inc_ingress_dropped(&self) {
        bump(&self.ingress_dropped, 1);
    }

    #[inline(always)]
    pub fn inc_intensity_updates(&self) {
        bump(&self.intensity_updates, 1);
    }

    #[inline(always)]
    pub fn record_decision(&self, latency_ns: u64) {
        bump(&self.decisions_made, 1);
        bump(&self.decision_latency_ns, latency_ns);
    }

    #[inline(always)]
    pub fn inc_stage_dropped(&self) {
        bump(&self.stage_dropped, 1);
    }

    #[inline(always)]
    pub fn inc_orders(&self) {
        bump(&self.orders_emitted, 1);
    }

    #[inline(always)]
    pub fn inc_egress_dropped(&self) {
        bump(&self.egress_dropped, 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &CacheAligned<AtomicU64>| c.get().load(Ordering::Relaxed);
        MetricsSnapshot {
            events_ingested: load(&self.events_ingested),
            ingress_dropped: load(&self.ingress_dropped),
            intensity_updates: load(&self.intensity_updates),
            decisions_made: load(&self.decisions_made),
            decision_latency_ns: load(&self.decision_latency_ns),
            stage_dropped: load(&self.stage_dropped),
            orders_emitted: load(&self.orders_emitted),
            egress_dropped: load(&self.egress_dropped),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub events_ingested: u64,
    pub ingress_dropped: u64,
    pub intensity_updates: u64,
    pub decisions_made: u64,
    pub decision_latency_ns: u64,
    pub stage_dropped: u64,
    pub orders_emitted: u64,
    pub egress_dropped: u64,
}

impl MetricsSnapshot {
    /// Mean time spent in the decision stage
    pub fn avg_decision_latency_ns(&self) -> f64 {
        if self.decisions_made > 0 {
            self.decision_latency_ns as f64 / self.decisions_made as f64
        } else {
            0.0
        }
    }

    /// Records lost to backpressure anywhere in the pipeline
    pub fn total_dropped(&self) -> u64 {
        self.ingress_dropped + self.stage_dropped + self.egress_dropped
    }
}
