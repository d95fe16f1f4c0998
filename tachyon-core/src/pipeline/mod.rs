//! Pipeline assembly
//!
//! - [`TradingCycle`]: the stages run back to back on one thread (replay)
//! - [`LivePipeline`]: one thread per stage, chained by SPSC rings

pub mod cycle;
pub mod live;

pub use cycle::{CycleOutput, TradingCycle};
pub use live::{FeedHandle, LivePipeline};
