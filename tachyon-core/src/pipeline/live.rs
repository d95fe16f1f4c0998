//! Multi-threaded live pipeline
//!
//! ```text
//! feed ─► [ingress] ─► intensity ─► [ring] ─► decision ─► [ring] ─► risk ─► [egress] ─► gateway
//!                       thread                 thread                thread
//! ```
//!
//! Each arrow is an `SpscRing`; each stage is one (optionally pinned) thread.
//! A full ring drops the record and bumps a counter, so no stage ever blocks
//! on a slower neighbour.
//!
//! ## Shutdown
//! The intensity stage stops once the shutdown flag is set (or the feed is
//! dropped) and its input is empty. Dropping its producer closes the next
//! ring, and each downstream stage drains its input and exits in turn.

use crate::config::PipelineConfig;
use crate::core::{Decision, EventKind, MarketEvent, MonotonicClock, Order};
use crate::decision::{DecisionStage, FeatureVector};
use crate::hawkes::{IntensityEngine, IntensityState, SharedIntensity};
use crate::perf::{prepare_stage_thread, MetricsSnapshot, PipelineMetrics};
use crate::risk::{GateCounters, GateStats, RiskGate, RiskSnapshot, RiskState, VolatilityIndex};
use crate::transport::{Consumer, Producer, SpscRing};
use anyhow::{Context, Result};
use crossbeam_utils::Backoff;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Intensity stage output
#[derive(Debug, Clone, Copy)]
struct IntensityUpdate {
    event: MarketEvent,
    state: IntensityState,
}

/// Decision stage output
#[derive(Debug, Clone, Copy)]
struct DecisionRecord {
    sequence_id: u64,
    decision: Decision,
}

/// Producer side handed to the external market data feed
pub struct FeedHandle {
    producer: Producer<MarketEvent>,
    metrics: Arc<PipelineMetrics>,
}

impl FeedHandle {
    /// Push an event; false (and counted) when the ingress ring is full
    #[inline(always)]
    pub fn publish(&mut self, event: MarketEvent) -> bool {
        match self.producer.try_push(event) {
            Ok(()) => {
                self.metrics.inc_ingested();
                true
            }
            Err(_) => {
                self.metrics.inc_ingress_dropped();
                false
            }
        }
    }

    /// Raw producer access for feeds that handle backpressure themselves
    pub fn producer(&mut self) -> &mut Producer<MarketEvent> {
        &mut self.producer
    }
}

/// Running pipeline: owns the stage threads and the shared read-side state
pub struct LivePipeline {
    shutdown: Arc<AtomicBool>,
    threads: Vec<(&'static str, JoinHandle<u64>)>,
    metrics: Arc<PipelineMetrics>,
    intensity: Arc<SharedIntensity>,
    risk: Arc<RiskState>,
    gate_counters: Arc<GateCounters>,
}

impl LivePipeline {
    /// Build every ring and spawn the three stage threads
    ///
    /// Returns the pipeline, the feed's producer handle and the gateway's
    /// order consumer.
    pub fn start(config: &PipelineConfig, risk: Arc<RiskState>) -> Result<(Self, FeedHandle, Consumer<Order>)> {
        config.validate().context("Invalid pipeline configuration")?;

        let (feed_tx, ingress_rx) = SpscRing::with_capacity(config.transport.ingress_capacity)?.split();
        let (intensity_tx, decision_rx) = SpscRing::with_capacity(config.transport.stage_capacity)?.split();
        let (decision_tx, risk_rx) = SpscRing::with_capacity(config.transport.stage_capacity)?.split();
        let (egress_tx, egress_rx) = SpscRing::with_capacity(config.transport.egress_capacity)?.split();

        let shutdown = Arc::new(AtomicBool::new(false));
        let metrics = Arc::new(PipelineMetrics::new());
        let shared_intensity = Arc::new(SharedIntensity::new());

        let engine = IntensityEngine::new(config.intensity)?;
        let stage = DecisionStage::new(config.decision, MonotonicClock::new())?;
        let gate = RiskGate::new(Arc::clone(&risk), config.risk.gate);
        let gate_counters = gate.counters();
        let volatility = (config.risk.volatility_halflife > 0)
            .then(|| VolatilityIndex::new(config.risk.volatility_halflife));
        let scale_to_capacity = config.risk.scale_to_capacity;

        let live = config.live;
        let core = |c: usize| if live.pin_threads { Some(c) } else { None };

        let mut threads = Vec::with_capacity(3);

        threads.push((
            "intensity",
            spawn_stage(
                "intensity",
                core(live.intensity_core),
                live.realtime_priority,
                {
                    let shutdown = Arc::clone(&shutdown);
                    let metrics = Arc::clone(&metrics);
                    let shared = Arc::clone(&shared_intensity);
                    let risk = Arc::clone(&risk);
                    move || {
                        let regime = volatility.map(|index| (index, risk));
                        run_intensity_stage(engine, regime, ingress_rx, intensity_tx, &shutdown, &metrics, &shared)
                    }
                },
            )?,
        ));

        threads.push((
            "decision",
            spawn_stage(
                "decision",
                core(live.decision_core),
                live.realtime_priority,
                {
                    let metrics = Arc::clone(&metrics);
                    move || run_decision_stage(stage, decision_rx, decision_tx, &metrics)
                },
            )?,
        ));

        threads.push((
            "risk",
            spawn_stage("risk", core(live.risk_core), live.realtime_priority, {
                let metrics = Arc::clone(&metrics);
                move || run_risk_stage(gate, scale_to_capacity, risk_rx, egress_tx, &metrics)
            })?,
        ));

        info!(
            "Live pipeline started (ingress={}, stage={}, egress={}, pinned={})",
            config.transport.ingress_capacity,
            config.transport.stage_capacity,
            config.transport.egress_capacity,
            live.pin_threads
        );

        let pipeline = Self {
            shutdown,
            threads,
            metrics: Arc::clone(&metrics),
            intensity: shared_intensity,
            risk,
            gate_counters,
        };
        let feed = FeedHandle {
            producer: feed_tx,
            metrics,
        };
        Ok((pipeline, feed, egress_rx))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Latest published intensity
    pub fn intensity(&self) -> IntensityState {
        self.intensity.load()
    }

    pub fn risk(&self) -> RiskSnapshot {
        self.risk.snapshot()
    }

    pub fn gate_stats(&self) -> GateStats {
        self.gate_counters.snapshot()
    }

    /// Shared flag, for wiring into signal handlers
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal shutdown, wait for every stage to drain, return final metrics
    pub fn shutdown(mut self) -> Result<MetricsSnapshot> {
        self.shutdown.store(true, Ordering::Release);
        self.join_all()?;

        let snapshot = self.metrics.snapshot();
        info!(
            "Live pipeline stopped: ingested={} decisions={} orders={} dropped={}",
            snapshot.events_ingested,
            snapshot.decisions_made,
            snapshot.orders_emitted,
            snapshot.total_dropped()
        );
        Ok(snapshot)
    }

    fn join_all(&mut self) -> Result<()> {
        for (name, handle) in self.threads.drain(..) {
            let processed = handle
                .join()
                .map_err(|_| anyhow::anyhow!("{} stage thread panicked", name))?;
            info!("{} stage exited after {} records", name, processed);
        }
        Ok(())
    }
}

impl Drop for LivePipeline {
    fn drop(&mut self) {
        if self.threads.is_empty() {
            return;
        }
        self.shutdown.store(true, Ordering::Release);
        if let Err(e) = self.join_all() {
            warn!("Live pipeline drop: {:#}", e);
        }
    }
}

fn spawn_stage<F>(name: &'static str, core: Option<usize>, priority: Option<i32>, body: F) -> Result<JoinHandle<u64>>
where
    F: FnOnce() -> u64 + Send + 'static,
{
    std::thread::Builder::new()
        .name(format!("tachyon-{}", name))
        .spawn(move || {
            prepare_stage_thread(name, core, priority);
            info!("{} stage started", name);
            body()
        })
        .with_context(|| format!("Failed to spawn {} stage thread", name))
}

/// Pop, process, push until the input is finished
///
/// The input is finished when it is empty and either its producer is gone or
/// `stop` says so. Returns the number of records consumed.
#[inline]
fn stage_loop<I: Send, O: Send>(
    input: &mut Consumer<I>,
    output: &mut Producer<O>,
    stop: impl Fn() -> bool,
    mut step: impl FnMut(I) -> Option<O>,
    mut on_full: impl FnMut(),
) -> u64 {
    let backoff = Backoff::new();
    let mut processed = 0u64;

    loop {
        if let Some(item) = input.try_pop() {
            backoff.reset();
            processed += 1;
            if let Some(out) = step(item) {
                if output.try_push(out).is_err() {
                    on_full();
                }
            }
            continue;
        }

        if input.is_closed() || stop() {
            if input.is_empty() {
                break;
            }
            continue;
        }
        backoff.snooze();
    }

    processed
}

fn run_intensity_stage(
    mut engine: IntensityEngine,
    mut regime: Option<(VolatilityIndex, Arc<RiskState>)>,
    mut input: Consumer<MarketEvent>,
    mut output: Producer<IntensityUpdate>,
    shutdown: &AtomicBool,
    metrics: &PipelineMetrics,
    shared: &SharedIntensity,
) -> u64 {
    stage_loop(
        &mut input,
        &mut output,
        || shutdown.load(Ordering::Acquire),
        |event| {
            if let (Some((index, risk)), EventKind::Trade) = (&mut regime, event.kind) {
                risk.apply_volatility(index.update(event.price));
            }
            let state = engine.update(&event, event.timestamp_ns);
            shared.store(&state);
            metrics.inc_intensity_updates();
            Some(IntensityUpdate { event, state })
        },
        || metrics.inc_stage_dropped(),
    )
}

fn run_decision_stage(
    mut stage: DecisionStage<MonotonicClock>,
    mut input: Consumer<IntensityUpdate>,
    mut output: Producer<DecisionRecord>,
    metrics: &PipelineMetrics,
) -> u64 {
    stage_loop(
        &mut input,
        &mut output,
        || false,
        |update| {
            let features = FeatureVector::from_state(&update.state, &update.event);
            let decision = stage.decide(&features, update.event.timestamp_ns);
            metrics.record_decision(stage.last_latency_ns());
            Some(DecisionRecord {
                sequence_id: update.event.sequence_id,
                decision,
            })
        },
        || metrics.inc_stage_dropped(),
    )
}

fn run_risk_stage(
    mut gate: RiskGate,
    scale_to_capacity: bool,
    mut input: Consumer<DecisionRecord>,
    mut output: Producer<Order>,
    metrics: &PipelineMetrics,
) -> u64 {
    stage_loop(
        &mut input,
        &mut output,
        || false,
        |record| {
            let decision = if scale_to_capacity {
                gate.state().fit_to_capacity(record.decision)
            } else {
                record.decision
            };
            let order = gate
                .check_and_apply(&decision, record.sequence_id)
                .order()
                .copied();
            if order.is_some() {
                metrics.inc_orders();
            }
            order
        },
        || metrics.inc_egress_dropped(),
    )
}
