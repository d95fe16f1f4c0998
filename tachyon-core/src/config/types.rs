use super::constants::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub transport: TransportConfig,
    pub scheduler: SchedulerConfig,
    pub intensity: IntensityConfig,
    pub decision: DecisionConfig,
    pub risk: RiskConfig,
    pub replay: ReplayConfig,
    pub live: LiveConfig,
    pub logging: LoggingConfig,
}

/// Ring capacities (all powers of two)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub ingress_capacity: usize,
    pub stage_capacity: usize,
    pub egress_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            stage_capacity: DEFAULT_STAGE_CAPACITY,
            egress_capacity: DEFAULT_EGRESS_CAPACITY,
        }
    }
}

/// Timing wheel and pool sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of wheel slots (power of two)
    pub wheel_slots: usize,
    /// Width of a slot in nanoseconds
    pub slot_width_ns: u64,
    /// Maximum pending events
    pub pool_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            wheel_slots: DEFAULT_WHEEL_SLOTS,
            slot_width_ns: DEFAULT_SLOT_WIDTH_NS,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

/// Hawkes kernel parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntensityConfig {
    /// Exponential decay rate λ (1/s)
    pub decay_per_sec: f64,
    /// Excitation α added per matching event
    pub excitation: f64,
    /// Scale the excitation by event size
    pub size_weighted: bool,
}

impl Default for IntensityConfig {
    fn default() -> Self {
        Self {
            decay_per_sec: DEFAULT_DECAY_PER_SEC,
            excitation: DEFAULT_EXCITATION,
            size_weighted: false,
        }
    }
}

/// Feature/decision stage parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Minimum time spent inside `decide`
    pub latency_floor_ns: u64,
    /// Imbalance distance from 0.5 required to trade
    pub threshold: f64,
    /// Quote offset from the reference price (bps)
    pub edge_bps: f64,
    /// Order size at full signal strength
    pub base_size: u64,
    /// Step of the manual clock used during replay
    pub replay_clock_step_ns: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            latency_floor_ns: DEFAULT_LATENCY_FLOOR_NS,
            threshold: DEFAULT_SIGNAL_THRESHOLD,
            edge_bps: DEFAULT_EDGE_BPS,
            base_size: DEFAULT_BASE_SIZE,
            replay_clock_step_ns: DEFAULT_REPLAY_CLOCK_STEP_NS,
        }
    }
}

/// Risk state and gate parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Absolute position limit before the regime multiplier
    pub position_limit: i64,
    /// Scale each decision's size by the capacity left under the limit
    pub scale_to_capacity: bool,
    /// Trades per half-life of the volatility index driving the regime
    /// (0 = regime only changes through `RiskState::set_regime`)
    pub volatility_halflife: u32,
    pub gate: RiskGateConfig,
    pub regimes: RegimeTable,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            position_limit: DEFAULT_POSITION_LIMIT,
            scale_to_capacity: DEFAULT_SCALE_TO_CAPACITY,
            volatility_halflife: DEFAULT_VOLATILITY_HALFLIFE,
            gate: RiskGateConfig::default(),
            regimes: RegimeTable::default(),
        }
    }
}

/// Risk gate tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskGateConfig {
    /// CAS attempts before `Contention` is returned
    pub max_cas_retries: u32,
}

impl Default for RiskGateConfig {
    fn default() -> Self {
        Self {
            max_cas_retries: DEFAULT_MAX_CAS_RETRIES,
        }
    }
}

/// Volatility index to regime mapping
///
/// `vol < normal_max` is Normal, `< elevated_max` Elevated, `< stress_max`
/// Elevated at the stress multiplier, anything above halts trading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeTable {
    pub normal_max: f64,
    pub elevated_max: f64,
    pub stress_max: f64,
    pub elevated_multiplier: f64,
    pub stress_multiplier: f64,
}

impl Default for RegimeTable {
    fn default() -> Self {
        Self {
            normal_max: DEFAULT_NORMAL_VOL_MAX,
            elevated_max: DEFAULT_ELEVATED_VOL_MAX,
            stress_max: DEFAULT_STRESS_VOL_MAX,
            elevated_multiplier: DEFAULT_ELEVATED_MULTIPLIER,
            stress_multiplier: DEFAULT_STRESS_MULTIPLIER,
        }
    }
}

/// Replay run parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Seed for the synthetic source and the fill simulator
    pub seed: u64,
    /// Directory receiving the audit files
    pub output_dir: PathBuf,
    pub fill: FillModelConfig,
    pub synthetic: SyntheticConfig,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_REPLAY_SEED,
            output_dir: PathBuf::from("replay-out"),
            fill: FillModelConfig::default(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

/// Simulated fill latency and slippage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillModelConfig {
    pub base_latency_ns: u64,
    pub latency_jitter_ns: u64,
    pub max_slippage_bps: f64,
}

impl Default for FillModelConfig {
    fn default() -> Self {
        Self {
            base_latency_ns: DEFAULT_FILL_LATENCY_NS,
            latency_jitter_ns: DEFAULT_FILL_JITTER_NS,
            max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
        }
    }
}

/// Synthetic event source shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub count: usize,
    pub start_price: f64,
    /// Mean gap between consecutive events
    pub mean_gap_ns: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_SYNTHETIC_COUNT,
            start_price: DEFAULT_SYNTHETIC_START_PRICE,
            mean_gap_ns: DEFAULT_SYNTHETIC_MEAN_GAP_NS,
        }
    }
}

/// Live pipeline thread placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Pin stage threads to the cores below
    pub pin_threads: bool,
    pub intensity_core: usize,
    pub decision_core: usize,
    pub risk_core: usize,
    /// SCHED_FIFO priority for stage threads (Linux only)
    pub realtime_priority: Option<i32>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            pin_threads: false,
            intensity_core: DEFAULT_INTENSITY_CORE,
            decision_core: DEFAULT_DECISION_CORE,
            risk_core: DEFAULT_RISK_CORE,
            realtime_priority: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Enable JSON logging
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
