//! Risk Management
//!
//! Shared `RiskState` plus the `RiskGate` that every decision passes through
//! before it becomes an order.
//!
//! ## Validation
//!
//! ```text
//! Decision → RiskGate ─┬─ Accepted(Order) → gateway
//!            (CAS)     └─ Rejected(RejectReason)
//!                        Halted | Breach | Contention | EmptyDecision | Overflow
//! ```
//!
//! Invariant after every accepted order:
//! `|position| <= floor(limit * multiplier)`.

pub mod gate;
pub mod state;
pub mod types;
pub mod volatility;

pub use gate::{GateCounters, GateStats, RiskGate};
pub use state::{RiskState, MULTIPLIER_SCALE};
pub use types::{GateOutcome, Regime, RejectReason, RiskSnapshot};
pub use volatility::VolatilityIndex;
