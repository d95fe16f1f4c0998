//! Default values for pipeline configuration
//!
//! Every runtime section in `types` falls back to these when a field is
//! omitted from the TOML file.

// ===== TRANSPORT =====

/// Ingress ring (external feed -> intensity stage)
pub const DEFAULT_INGRESS_CAPACITY: usize = 4096;

/// Rings between stage threads
pub const DEFAULT_STAGE_CAPACITY: usize = 1024;

/// Egress ring (risk stage -> order gateway)
pub const DEFAULT_EGRESS_CAPACITY: usize = 1024;

// ===== SCHEDULER =====

/// Timing wheel slots (power of two)
pub const DEFAULT_WHEEL_SLOTS: usize = 1024;

/// Width of one wheel slot: 10µs
pub const DEFAULT_SLOT_WIDTH_NS: u64 = 10_000;

/// Fixed event pool size
pub const DEFAULT_POOL_CAPACITY: usize = 4096;

// ===== INTENSITY =====

/// Kernel decay rate λ in 1/s (1ms time constant)
pub const DEFAULT_DECAY_PER_SEC: f64 = 1_000.0;

/// Jump added to the matching side per event
pub const DEFAULT_EXCITATION: f64 = 1.0;

// ===== DECISION =====

/// Fixed inference latency floor
pub const DEFAULT_LATENCY_FLOOR_NS: u64 = 400;

/// Distance of the order-book imbalance from 0.5 required to trade
pub const DEFAULT_SIGNAL_THRESHOLD: f64 = 0.1;

/// Price offset from the reference price, in basis points
pub const DEFAULT_EDGE_BPS: f64 = 1.0;

/// Order size at full signal strength
pub const DEFAULT_BASE_SIZE: u64 = 10;

/// Per-read step of the deterministic replay clock
pub const DEFAULT_REPLAY_CLOCK_STEP_NS: u64 = 50;

// ===== RISK =====

/// Absolute position limit before the regime multiplier
pub const DEFAULT_POSITION_LIMIT: i64 = 1_000;

/// CAS attempts before a decision is rejected for contention
pub const DEFAULT_MAX_CAS_RETRIES: u32 = 64;

/// Shrink decision sizes by the remaining position capacity
pub const DEFAULT_SCALE_TO_CAPACITY: bool = true;

/// Half-life, in trades, of the volatility index; 0 leaves the regime manual
pub const DEFAULT_VOLATILITY_HALFLIFE: u32 = 0;

/// Volatility index bands for regime classification
pub const DEFAULT_NORMAL_VOL_MAX: f64 = 0.5;
pub const DEFAULT_ELEVATED_VOL_MAX: f64 = 1.0;
pub const DEFAULT_STRESS_VOL_MAX: f64 = 2.0;

/// Regime multipliers applied to the position limit
pub const DEFAULT_ELEVATED_MULTIPLIER: f64 = 0.7;
pub const DEFAULT_STRESS_MULTIPLIER: f64 = 0.4;

// ===== REPLAY =====

/// Seed for synthetic sources and the fill simulator
pub const DEFAULT_REPLAY_SEED: u64 = 42;

/// Simulated order acknowledgement latency
pub const DEFAULT_FILL_LATENCY_NS: u64 = 500;

/// Uniform jitter added on top of the base fill latency
pub const DEFAULT_FILL_JITTER_NS: u64 = 250;

/// Maximum adverse slippage per fill, in basis points
pub const DEFAULT_MAX_SLIPPAGE_BPS: f64 = 0.5;

/// Synthetic source defaults
pub const DEFAULT_SYNTHETIC_COUNT: usize = 1_000;
pub const DEFAULT_SYNTHETIC_START_PRICE: f64 = 100.0;
pub const DEFAULT_SYNTHETIC_MEAN_GAP_NS: u64 = 2_000;

// ===== LIVE =====

/// Cores for the three stage threads when pinning is enabled
pub const DEFAULT_INTENSITY_CORE: usize = 1;
pub const DEFAULT_DECISION_CORE: usize = 2;
pub const DEFAULT_RISK_CORE: usize = 3;
