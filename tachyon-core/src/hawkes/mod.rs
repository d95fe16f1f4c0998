//! Hawkes intensity engine
//!
//! - `kernel`: recursive exponential-kernel updater (single writer)
//! - `shared`: seqlock-style publication of the latest state to other threads

pub mod kernel;
pub mod shared;

pub use kernel::{IntensityEngine, IntensityState, INTENSITY_FLOOR};
pub use shared::SharedIntensity;
