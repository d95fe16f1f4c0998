//! Core zero-overhead types for the event pipeline
//!
//! This module provides the records every stage exchanges:
//! - `MarketEvent`: immutable ingestion record
//! - `Decision` / `Order`: decision stage output and accepted order
//! - `Clock`: monotonic time source (real or deterministic)
//! - Error taxonomy shared by all stages
//!
//! All records are `Copy` and heap-free so they can sit in ring slots and
//! scheduler pools without allocation.

pub mod clock;
pub mod errors;
pub mod types;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use errors::{CapacityExceeded, ConfigError, DecodeError, ErrorKind};
pub use types::{Decision, EventKind, MarketEvent, Order, Side};
