//! Risk gate vocabulary
//!
//! Regimes, reject reasons, the gate's outcome type and the snapshot
//! written to `risk.log`. Display impls are hand-written so the audit
//! text stays stable across releases.

use crate::core::{ErrorKind, Order};
use std::fmt;

/// Market regime controlling the position-limit multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Regime {
    Normal = 0,
    Elevated = 1,
    /// Kill switch: every decision is rejected
    Halted = 2,
}

impl Regime {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Regime::Normal => "NORMAL",
            Regime::Elevated => "ELEVATED",
            Regime::Halted => "HALTED",
        }
    }

    /// Unknown tags decode as `Halted`
    #[inline(always)]
    pub const fn from_u8(tag: u8) -> Regime {
        match tag {
            0 => Regime::Normal,
            1 => Regime::Elevated,
            _ => Regime::Halted,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the gate refused a decision (zero allocation)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Regime is `Halted`
    Halted,
    /// Prospective position would exceed the effective limit
    Breach { prospective: i64, max: i64 },
    /// CAS retry cap hit under contention
    Contention,
    /// Hold decision (`size == 0`)
    EmptyDecision,
    /// Position arithmetic would overflow
    Overflow,
}

impl RejectReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Halted => "HALTED",
            RejectReason::Breach { .. } => "BREACH",
            RejectReason::Contention => "CONTENTION",
            RejectReason::EmptyDecision => "EMPTY",
            RejectReason::Overflow => "OVERFLOW",
        }
    }

    /// Error class for counting, `None` for a plain hold
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            RejectReason::Halted | RejectReason::Breach { .. } | RejectReason::Overflow => {
                Some(ErrorKind::RiskBreach)
            }
            RejectReason::Contention => Some(ErrorKind::ContentionExceeded),
            RejectReason::EmptyDecision => None,
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Breach { prospective, max } => {
                write!(f, "BREACH prospective={} max={}", prospective, max)
            }
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of one gate check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateOutcome {
    Accepted(Order),
    Rejected(RejectReason),
}

impl GateOutcome {
    #[inline(always)]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateOutcome::Accepted(_))
    }

    #[inline(always)]
    pub fn order(&self) -> Option<&Order> {
        match self {
            GateOutcome::Accepted(order) => Some(order),
            GateOutcome::Rejected(_) => None,
        }
    }

    #[inline(always)]
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            GateOutcome::Accepted(_) => None,
            GateOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

impl fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOutcome::Accepted(order) => write!(f, "ACCEPT {}", order),
            GateOutcome::Rejected(reason) => write!(f, "REJECT {}", reason),
        }
    }
}

/// Point-in-time view of the shared risk state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSnapshot {
    pub position: i64,
    pub limit: i64,
    pub regime: Regime,
    pub multiplier: f64,
    /// `floor(limit * multiplier)`
    pub effective_limit: i64,
}

impl fmt::Display for RiskSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pos={} limit={} regime={} mult={} max={}",
            self.position, self.limit, self.regime, self.multiplier, self.effective_limit
        )
    }
}
