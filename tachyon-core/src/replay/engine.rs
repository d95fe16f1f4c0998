//! Replay engine
//!
//! Events are scheduled by `(timestamp_ns, sequence_id)` and dispatched in
//! that order through a `TradingCycle` whose decision stage runs on a
//! `ManualClock`. Accepted orders become fills scheduled back into the same
//! scheduler at `timestamp + latency`.
//!
//! A full scheduler pool never aborts a run. The input (or fill) that did
//! not fit is dropped, counted, and recorded in `replay.log`; a dropped
//! fill is backed out of the risk gate so gate and ledger stay in step.

use super::audit::{sha256_hex, AuditLog, ChainKind, ChainSummary};
use super::fill::{FillSimulator, SimulatedFill};
use super::ledger::ReplayLedger;
use super::manifest::write_manifest;
use super::source::{write_events, ReplaySource};
use super::{ReplayError, ReplayPhase};
use crate::config::PipelineConfig;
use crate::core::{CapacityExceeded, ManualClock, MarketEvent};
use crate::pipeline::{CycleOutput, TradingCycle};
use crate::risk::{GateOutcome, RejectReason, RiskState};
use crate::scheduler::{EventScheduler, ScheduledEvent};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the scheduler carries during a replay
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReplayItem {
    Input(MarketEvent),
    Fill(SimulatedFill),
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub source: String,
    pub seed: u64,
    pub input_sha256: String,
    pub events: u64,
    pub decisions: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub fills: u64,
    /// Inputs and fills dropped because the scheduler pool was full
    pub dropped: u64,
    /// Position as tracked by the risk gate
    pub risk_position: i64,
    /// Position as tracked by the fill ledger
    pub ledger_position: i64,
    pub cash: f64,
    pub equity: f64,
    pub volume: u64,
    pub avg_decision_latency_ns: f64,
    pub replay_chain: ChainSummary,
    pub risk_chain: ChainSummary,
    pub output_dir: PathBuf,
}

impl fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source:      {}", self.source)?;
        writeln!(f, "seed:        {}", self.seed)?;
        writeln!(f, "events:      {}", self.events)?;
        writeln!(f, "decisions:   {} ({} accepted, {} rejected)", self.decisions, self.accepted, self.rejected)?;
        writeln!(f, "fills:       {} (volume {})", self.fills, self.volume)?;
        writeln!(f, "dropped:     {}", self.dropped)?;
        writeln!(f, "position:    {}", self.ledger_position)?;
        writeln!(f, "cash:        {:.4}", self.cash)?;
        writeln!(f, "equity:      {:.4}", self.equity)?;
        writeln!(f, "latency:     {:.1}ns avg", self.avg_decision_latency_ns)?;
        writeln!(f, "replay head: {} ({} entries)", self.replay_chain.head, self.replay_chain.entries)?;
        write!(f, "risk head:   {} ({} entries)", self.risk_chain.head, self.risk_chain.entries)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct RunCounts {
    events: u64,
    decisions: u64,
    accepted: u64,
    rejected: u64,
    dropped: u64,
    latency_ns: u64,
}

/// Per-run state threaded through dispatch
struct ReplayRun {
    cycle: TradingCycle<ManualClock>,
    fills: FillSimulator,
    ledger: ReplayLedger,
    replay_log: AuditLog,
    risk_log: AuditLog,
    risk: Arc<RiskState>,
    counts: RunCounts,
}

impl ReplayRun {
    fn new(config: &PipelineConfig, output_dir: &Path, input_sha256: &str) -> Result<Self, ReplayError> {
        let seed = config.replay.seed;
        let risk = Arc::new(RiskState::from_config(&config.risk));
        let clock = ManualClock::new(0, config.decision.replay_clock_step_ns);
        Ok(Self {
            cycle: TradingCycle::new(config, clock, Arc::clone(&risk))?,
            fills: FillSimulator::new(seed, config.replay.fill),
            ledger: ReplayLedger::new(),
            replay_log: AuditLog::create(output_dir, ChainKind::Replay, seed, input_sha256)?,
            risk_log: AuditLog::create(output_dir, ChainKind::Risk, seed, input_sha256)?,
            risk,
            counts: RunCounts::default(),
        })
    }

    fn drop_input(&mut self, event: &MarketEvent, full: CapacityExceeded) -> Result<(), ReplayError> {
        self.counts.dropped += 1;
        debug!("seq {} dropped: {}", event.sequence_id, full);
        self.replay_log.append(&format!(
            "seq={} ts={} dropped=input event=[{}] reason=[{}]",
            event.sequence_id, event.timestamp_ns, event, full
        ))
    }

    fn dispatch(
        &mut self,
        item: ScheduledEvent<ReplayItem>,
        scheduler: &mut EventScheduler<ReplayItem>,
    ) -> Result<(), ReplayError> {
        match item.payload {
            ReplayItem::Input(event) => self.on_input(&event, scheduler),
            ReplayItem::Fill(fill) => self.on_fill(item.sequence_id, &fill),
        }
    }

    fn on_input(
        &mut self,
        event: &MarketEvent,
        scheduler: &mut EventScheduler<ReplayItem>,
    ) -> Result<(), ReplayError> {
        let out = self.cycle.process(event);
        self.ledger.mark(event.price);

        self.counts.events += 1;
        self.counts.latency_ns += out.decision_latency_ns;
        if out.decision.is_actionable() {
            self.counts.decisions += 1;
        }

        self.replay_log.append(&input_entry(event, &out))?;

        match out.outcome {
            GateOutcome::Accepted(order) => {
                let fill = self.fills.simulate(&order, event.timestamp_ns);
                match scheduler.schedule(ReplayItem::Fill(fill), fill.fill_time_ns) {
                    Ok(_) => self.counts.accepted += 1,
                    Err(full) => {
                        self.counts.dropped += 1;
                        if !self.cycle.gate_mut().revert(&order) {
                            warn!("Order {} could not be backed out of the risk gate", order);
                        }
                        debug!("fill for order {} dropped: {}", order, full);
                        self.replay_log.append(&format!(
                            "seq={} ts={} dropped=fill order=[{}] reason=[{}] risk_pos={}",
                            event.sequence_id,
                            event.timestamp_ns,
                            order,
                            full,
                            self.risk.position()
                        ))?;
                    }
                }
            }
            GateOutcome::Rejected(RejectReason::EmptyDecision) => {}
            GateOutcome::Rejected(reason) => {
                self.counts.rejected += 1;
                debug!("seq {} rejected: {}", event.sequence_id, reason);
                self.risk_log.append(&format!(
                    "seq={} ts={} reason=[{}] decision=[{}] risk=[{}]",
                    event.sequence_id,
                    event.timestamp_ns,
                    reason,
                    out.decision,
                    self.risk.snapshot()
                ))?;
            }
        }
        Ok(())
    }

    fn on_fill(&mut self, sequence_id: u64, fill: &SimulatedFill) -> Result<(), ReplayError> {
        self.ledger.apply_fill(fill);
        self.replay_log.append(&format!(
            "seq={} ts={} fill=[{}] cause={} pos={} cash={}",
            sequence_id,
            fill.fill_time_ns,
            fill,
            fill.sequence_id,
            self.ledger.position(),
            self.ledger.cash()
        ))
    }
}

fn input_entry(event: &MarketEvent, out: &CycleOutput) -> String {
    format!(
        "seq={} ts={} event=[{}] state=[buy={} sell={}] decision=[{}] outcome=[{}] lat={}",
        event.sequence_id,
        event.timestamp_ns,
        event,
        out.state.buy_intensity,
        out.state.sell_intensity,
        out.decision,
        out.outcome,
        out.decision_latency_ns
    )
}

/// SHA-256 over the canonical CSV form of the (sorted) input
fn input_digest(events: &[MarketEvent]) -> Result<String, ReplayError> {
    let canonical = write_events(Vec::with_capacity(events.len() * 48), events).map_err(|e| ReplayError::Csv {
        file: "input".to_string(),
        source: e,
    })?;
    Ok(sha256_hex(&canonical))
}

pub struct ReplayEngine {
    config: PipelineConfig,
    phase: ReplayPhase,
    source: String,
    events: Vec<MarketEvent>,
    input_sha256: String,
}

impl ReplayEngine {
    pub fn new(config: PipelineConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self {
            config,
            phase: ReplayPhase::Idle,
            source: String::new(),
            events: Vec::new(),
            input_sha256: String::new(),
        })
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// Digest of the loaded input (empty before `load`)
    pub fn input_sha256(&self) -> &str {
        &self.input_sha256
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn transition(&mut self, next: ReplayPhase) -> Result<(), ReplayError> {
        if !self.phase.can_transition_to(next) {
            return Err(ReplayError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        info!("Replay phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Load and order the input events
    pub fn load(&mut self, source: ReplaySource) -> Result<usize, ReplayError> {
        self.transition(ReplayPhase::Loading)?;

        self.source = source.describe();
        let mut events = source.load()?;
        events.sort_by_key(|e| (e.timestamp_ns, e.sequence_id));

        self.input_sha256 = input_digest(&events)?;
        info!(
            "Loaded {} events from {} (input sha256 {})",
            events.len(),
            self.source,
            self.input_sha256
        );
        self.events = events;
        Ok(self.events.len())
    }

    /// Replay the loaded events and write the audit directory
    ///
    /// `generated_at` (unix ms) only lands in `manifest.json`.
    pub fn run(&mut self, generated_at: u64) -> Result<ReplaySummary, ReplayError> {
        self.transition(ReplayPhase::Replaying)?;

        let seed = self.config.replay.seed;
        let output_dir = self.config.replay.output_dir.clone();
        std::fs::create_dir_all(&output_dir).map_err(|e| ReplayError::io(&output_dir, e))?;

        let mut run = ReplayRun::new(&self.config, &output_dir, &self.input_sha256)?;

        let events = std::mem::take(&mut self.events);
        let start_ns = events.first().map_or(0, |e| e.timestamp_ns);
        let mut scheduler = EventScheduler::with_start_time(self.config.scheduler, start_ns)?;
        if let Some(max_seq) = events.iter().map(|e| e.sequence_id).max() {
            scheduler.reserve_sequence(max_seq.saturating_add(1));
        }

        let mut due = Vec::new();
        for (i, event) in events.iter().enumerate() {
            if let Err(full) =
                scheduler.schedule_with_sequence(ReplayItem::Input(*event), event.timestamp_ns, event.sequence_id)
            {
                run.drop_input(event, full)?;
            }

            // dispatch once every input sharing this timestamp is queued
            let last_at_ts = events
                .get(i + 1)
                .map_or(true, |next| next.timestamp_ns != event.timestamp_ns);
            if last_at_ts {
                scheduler.advance(event.timestamp_ns, &mut |item| due.push(item));
                for item in due.drain(..) {
                    run.dispatch(item, &mut scheduler)?;
                }
            }
        }

        // outstanding fills
        while let Some(fire_ns) = scheduler.next_fire_time() {
            let now_ns = fire_ns.max(scheduler.now_ns());
            scheduler.advance(now_ns, &mut |item| due.push(item));
            for item in due.drain(..) {
                run.dispatch(item, &mut scheduler)?;
            }
        }

        self.transition(ReplayPhase::Finalizing)?;

        let ReplayRun {
            cycle,
            ledger,
            replay_log,
            risk_log,
            risk,
            counts,
            ..
        } = run;
        let replay_chain = replay_log.finish()?;
        let risk_chain = risk_log.finish()?;
        write_manifest(
            &output_dir,
            &[replay_chain.clone(), risk_chain.clone()],
            seed,
            &self.input_sha256,
            generated_at,
        )?;

        let stats = cycle.gate().stats();
        if stats.rejected() > 0 {
            info!(
                "Rejections: halted={} breach={} contention={} overflow={}",
                stats.halted, stats.breach, stats.contention, stats.overflow
            );
        }
        if counts.dropped > 0 {
            warn!(
                "Scheduler pool ({} slots) dropped {} inputs/fills",
                self.config.scheduler.pool_capacity, counts.dropped
            );
        }
        if risk.position() != ledger.position() {
            warn!(
                "Risk position {} differs from ledger position {}",
                risk.position(),
                ledger.position()
            );
        }

        let summary = ReplaySummary {
            source: self.source.clone(),
            seed,
            input_sha256: self.input_sha256.clone(),
            events: counts.events,
            decisions: counts.decisions,
            accepted: counts.accepted,
            rejected: counts.rejected,
            fills: ledger.fills(),
            dropped: counts.dropped,
            risk_position: risk.position(),
            ledger_position: ledger.position(),
            cash: ledger.cash(),
            equity: ledger.equity(),
            volume: ledger.volume(),
            avg_decision_latency_ns: if counts.events > 0 {
                counts.latency_ns as f64 / counts.events as f64
            } else {
                0.0
            },
            replay_chain,
            risk_chain,
            output_dir,
        };

        self.transition(ReplayPhase::Done)?;
        info!(
            "Replay done: {} events, {} accepted, {} rejected, equity {:.4}",
            summary.events, summary.accepted, summary.rejected, summary.equity
        );
        Ok(summary)
    }
}

/// Load, replay and finalize in one call
pub fn run_replay(
    config: PipelineConfig,
    source: ReplaySource,
    generated_at: u64,
) -> Result<ReplaySummary, ReplayError> {
    let mut engine = ReplayEngine::new(config)?;
    engine.load(source)?;
    engine.run(generated_at)
}
