//! Common utilities for all binaries
//!
//! Shared initialization, CLI parsing, and setup code.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tachyon::config::PipelineConfig;
use tachyon::perf::MetricsSnapshot;

/// Common CLI arguments for all binaries
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Pipeline config file (TOML); defaults apply when omitted
    #[arg(short, long, env = "TACHYON_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// CPU core to pin the main thread to
    #[arg(long)]
    pub cpu_core: Option<usize>,

    /// SCHED_FIFO priority for the main thread (requires privileges)
    #[arg(long)]
    pub realtime: Option<i32>,
}

impl CommonArgs {
    /// Load the config file (or defaults) and apply CLI overrides
    pub fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.json_logs {
            config.logging.json = true;
        }

        config.validate().context("Invalid configuration after CLI overrides")?;
        Ok(config)
    }
}

/// Initialize tracing/logging from the `[logging]` section
pub fn init_logging(config: &PipelineConfig) {
    tachyon::utils::init_from_config(&config.logging);
}

/// Parse args, load config, start logging, pin the main thread
pub fn setup(args: &CommonArgs) -> Result<PipelineConfig> {
    let config = args.load_config()?;
    init_logging(&config);
    if let Some(path) = &args.config {
        tracing::info!("Using config {}", path.display());
    }
    setup_performance(args.cpu_core, args.realtime)?;
    Ok(config)
}

/// Setup CPU affinity and real-time priority for the calling thread
pub fn setup_performance(cpu_core: Option<usize>, realtime: Option<i32>) -> Result<()> {
    if let Some(core) = cpu_core {
        tachyon::perf::cpu::pin_to_core(core)?;
    }

    if let Some(priority) = realtime {
        tachyon::perf::cpu::set_realtime_priority(priority)?;
    }

    Ok(())
}

/// Wall-clock milliseconds, for `manifest.json` only
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Print final pipeline metrics
pub fn print_metrics(metrics: &MetricsSnapshot) {
    tracing::info!("=== Final Statistics ===");
    tracing::info!("Events ingested: {}", metrics.events_ingested);
    tracing::info!("Intensity updates: {}", metrics.intensity_updates);
    tracing::info!("Decisions: {}", metrics.decisions_made);
    tracing::info!("Orders emitted: {}", metrics.orders_emitted);
    tracing::info!(
        "Dropped: {} (ingress {}, stage {}, egress {})",
        metrics.total_dropped(),
        metrics.ingress_dropped,
        metrics.stage_dropped,
        metrics.egress_dropped
    );

    if metrics.decisions_made > 0 {
        tracing::info!("Avg decision latency: {:.1}ns", metrics.avg_decision_latency_ns());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(config: Option<PathBuf>) -> CommonArgs {
        CommonArgs {
            config,
            log_level: Some("debug".to_string()),
            json_logs: true,
            cpu_core: None,
            realtime: None,
        }
    }

    #[test]
    fn test_defaults_with_overrides() {
        let config = args(None).load_config().unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.transport, PipelineConfig::default().transport);
    }

    #[test]
    fn test_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tachyon.toml");
        std::fs::write(&path, "[replay]\nseed = 7\n").unwrap();

        let config = args(Some(path)).load_config().unwrap();
        assert_eq!(config.replay.seed, 7);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(args(Some(PathBuf::from("/nonexistent/tachyon.toml"))).load_config().is_err());
    }
}
