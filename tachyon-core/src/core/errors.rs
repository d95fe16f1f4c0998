//! Error taxonomy for the pipeline
//!
//! Hot-path conditions are small `Copy` values returned by value (never
//! panics, never allocation). Cold-path errors (construction, decoding) use
//! `thiserror` and may carry owned context.

use std::fmt;
use thiserror::Error;

/// Error classes shared across the pipeline, used for counting and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    /// Scheduler pool or ring transport full; the record is dropped and counted
    CapacityExceeded = 0,
    /// Risk gate CAS retry cap hit; decision rejected
    ContentionExceeded = 1,
    /// Prospective position would exceed the effective limit
    RiskBreach = 2,
    /// Hash chain or manifest mismatch during verification
    ReplayIntegrityFailure = 3,
    /// Construction-time configuration error
    ConfigInvalid = 4,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CapacityExceeded => "CapacityExceeded",
            ErrorKind::ContentionExceeded => "ContentionExceeded",
            ErrorKind::RiskBreach => "RiskBreach",
            ErrorKind::ReplayIntegrityFailure => "ReplayIntegrityFailure",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size pool exhausted (scheduler) or ring full (transport)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    /// Capacity of the structure that refused the record
    pub capacity: usize,
}

impl CapacityExceeded {
    #[inline(always)]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::CapacityExceeded
    }
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capacity exceeded (capacity: {})", self.capacity)
    }
}

impl std::error::Error for CapacityExceeded {}

/// Invalid configuration detected before any hot-path execution
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a non-zero power of two (got {value})")]
    NotPowerOfTwo { field: &'static str, value: usize },

    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{field} is out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

impl ConfigError {
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigInvalid
    }

    /// Validate a power-of-two capacity
    pub fn require_power_of_two(field: &'static str, value: usize) -> Result<usize, ConfigError> {
        if value != 0 && value.is_power_of_two() {
            Ok(value)
        } else {
            Err(ConfigError::NotPowerOfTwo { field, value })
        }
    }

    /// Validate a strictly positive, finite float
    pub fn require_positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ConfigError::NotPositive { field, value })
        }
    }
}

/// Failure to decode a wire record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unsupported layout version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("invalid side tag {0}")]
    InvalidSide(u8),

    #[error("invalid event kind tag {0}")]
    InvalidKind(u8),

    #[error("buffer too short: {len} bytes (need {need})")]
    Truncated { len: usize, need: usize },
}
