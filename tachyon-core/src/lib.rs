//! Tachyon Core - Deterministic Low-Latency Trading Pipeline
//!
//! Market events flow through a fixed chain of stages, each with a bounded
//! nanosecond budget, and every run can be replayed bit-for-bit and audited.
//!
//! ## Architecture
//! - **Zero heap allocations** in hot path
//! - **Cache-line aligned** shared state (64 bytes)
//! - **Lock-free** SPSC rings between stages, CAS-based risk gate
//! - **Deterministic** replay with SHA-256 chained audit logs
//!
//! ## Pipeline
//! ```text
//! MarketEvent → Hawkes intensity → features → decision → risk gate → Order
//! ```
//!
//! ## Core Modules
//! - `core`: Zero-overhead record types, clocks, error taxonomy
//! - `transport`: SPSC ring and the 64-byte wire layout
//! - `scheduler`: Timing wheel + heap event scheduler
//! - `hawkes`: Exponential-kernel intensity engine
//! - `decision`: Feature extraction and fixed-latency decision stage
//! - `risk`: Shared risk state and atomic pre-trade gate
//! - `pipeline`: Single-threaded cycle and multi-threaded live pipeline
//! - `replay`: Deterministic replay, fill simulation, audit and manifests

pub mod core;

pub mod config;
pub mod decision;
pub mod hawkes;
pub mod pipeline;
pub mod replay;
pub mod risk;
pub mod scheduler;
pub mod transport;
pub mod utils;

// Performance utilities
pub mod perf;

// Re-export core types
pub use core::{
    CapacityExceeded, Clock, ConfigError, Decision, ErrorKind, EventKind, ManualClock, MarketEvent,
    MonotonicClock, Order, Side,
};

pub use config::PipelineConfig;
pub use pipeline::{LivePipeline, TradingCycle};
pub use replay::{ReplayEngine, ReplayError, ReplaySummary};
pub use risk::{GateOutcome, RiskGate, RiskState};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    // Core types
    pub use crate::core::{Clock, Decision, EventKind, MarketEvent, Order, Side};

    // Stages
    pub use crate::decision::{DecisionStage, FeatureVector};
    pub use crate::hawkes::{IntensityEngine, IntensityState};
    pub use crate::risk::{GateOutcome, RejectReason, RiskGate, RiskState};
    pub use crate::scheduler::EventScheduler;
    pub use crate::transport::SpscRing;

    // Assembly
    pub use crate::config::PipelineConfig;
    pub use crate::pipeline::{LivePipeline, TradingCycle};
    pub use crate::replay::{ReplayEngine, ReplaySource};

    // Performance utilities
    pub use crate::perf::{pin_to_core, PipelineMetrics};

    // Error types
    pub use crate::{Error, Result};
}
