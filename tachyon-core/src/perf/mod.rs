//! Performance Utilities
//!
//! - **CPU affinity**: pin stage threads to specific cores
//! - **Lock-free metrics**: cache-aligned atomic counters

pub mod cpu;
pub mod metrics;

pub use cpu::{num_cores, pin_to_core, prepare_stage_thread, set_realtime_priority};
pub use metrics::{CacheAligned, MetricsSnapshot, PipelineMetrics};
