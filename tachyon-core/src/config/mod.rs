//! Runtime configuration
//!
//! A single TOML file with one table per pipeline stage. Every field has a
//! default, so an empty file is a valid configuration. `validate()` runs
//! before any ring, pool or thread is created.

pub mod constants;
pub mod types;

pub use types::*;

use crate::core::ConfigError;
use anyhow::{Context, Result};
use std::path::Path;

impl PipelineConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let cfg = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let cfg: PipelineConfig =
            toml::from_str(content).context("Failed to deserialize configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render as TOML (used to generate a starter config file)
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Transport
        ConfigError::require_power_of_two("transport.ingress_capacity", self.transport.ingress_capacity)?;
        ConfigError::require_power_of_two("transport.stage_capacity", self.transport.stage_capacity)?;
        ConfigError::require_power_of_two("transport.egress_capacity", self.transport.egress_capacity)?;

        // Scheduler
        self.scheduler.validate()?;

        // Intensity
        ConfigError::require_positive("intensity.decay_per_sec", self.intensity.decay_per_sec)?;
        if !self.intensity.excitation.is_finite() || self.intensity.excitation < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "intensity.excitation",
                reason: format!("must be finite and non-negative (got {})", self.intensity.excitation),
            });
        }

        // Decision
        let d = &self.decision;
        if !(0.0..0.5).contains(&d.threshold) {
            return Err(ConfigError::OutOfRange {
                field: "decision.threshold",
                reason: format!("must be in [0, 0.5) (got {})", d.threshold),
            });
        }
        if !d.edge_bps.is_finite() || d.edge_bps < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "decision.edge_bps",
                reason: format!("must be finite and non-negative (got {})", d.edge_bps),
            });
        }
        if d.base_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "decision.base_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if d.replay_clock_step_ns == 0 {
            return Err(ConfigError::OutOfRange {
                field: "decision.replay_clock_step_ns",
                reason: "must be at least 1".to_string(),
            });
        }

        // Risk
        if self.risk.position_limit < 0 {
            return Err(ConfigError::OutOfRange {
                field: "risk.position_limit",
                reason: format!("must be non-negative (got {})", self.risk.position_limit),
            });
        }
        if self.risk.gate.max_cas_retries == 0 {
            return Err(ConfigError::OutOfRange {
                field: "risk.gate.max_cas_retries",
                reason: "must be at least 1".to_string(),
            });
        }
        self.risk.regimes.validate()?;

        // Replay
        let fill = &self.replay.fill;
        if !fill.max_slippage_bps.is_finite() || fill.max_slippage_bps < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "replay.fill.max_slippage_bps",
                reason: format!("must be finite and non-negative (got {})", fill.max_slippage_bps),
            });
        }
        ConfigError::require_positive("replay.synthetic.start_price", self.replay.synthetic.start_price)?;

        // Logging
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::OutOfRange {
                field: "logging.level",
                reason: format!(
                    "'{}' is not one of {:?}",
                    self.logging.level, valid_log_levels
                ),
            });
        }

        Ok(())
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_power_of_two("scheduler.wheel_slots", self.wheel_slots)?;
        if self.slot_width_ns == 0 {
            return Err(ConfigError::OutOfRange {
                field: "scheduler.slot_width_ns",
                reason: "must be at least 1".to_string(),
            });
        }
        // pool indices are u32 with u32::MAX reserved as the list terminator
        if self.pool_capacity == 0 || self.pool_capacity >= u32::MAX as usize {
            return Err(ConfigError::OutOfRange {
                field: "scheduler.pool_capacity",
                reason: format!("must be in [1, {}) (got {})", u32::MAX, self.pool_capacity),
            });
        }
        Ok(())
    }
}

impl RegimeTable {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.normal_max > 0.0
            && self.normal_max <= self.elevated_max
            && self.elevated_max <= self.stress_max
            && self.stress_max.is_finite();
        if !ordered {
            return Err(ConfigError::OutOfRange {
                field: "risk.regimes",
                reason: "volatility bands must satisfy 0 < normal_max <= elevated_max <= stress_max"
                    .to_string(),
            });
        }
        for (field, value) in [
            ("risk.regimes.elevated_multiplier", self.elevated_multiplier),
            ("risk.regimes.stress_multiplier", self.stress_multiplier),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    reason: format!("must be in [0, 1] (got {})", value),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let cfg = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            [scheduler]
            wheel_slots = 256

            [intensity]
            decay_per_sec = 500.0
            size_weighted = true

            [risk]
            position_limit = 50

            [risk.gate]
            max_cas_retries = 8
            "#,
        )
        .unwrap();

        assert_eq!(cfg.scheduler.wheel_slots, 256);
        assert_eq!(cfg.scheduler.pool_capacity, constants::DEFAULT_POOL_CAPACITY);
        assert!(cfg.intensity.size_weighted);
        assert_eq!(cfg.risk.position_limit, 50);
        assert_eq!(cfg.risk.gate.max_cas_retries, 8);
        assert_eq!(cfg.replay.seed, 42);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PipelineConfig::default();

        config.transport.stage_capacity = 1000;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPowerOfTwo { value: 1000, .. })
        ));
        config.transport.stage_capacity = 1024;

        config.intensity.decay_per_sec = 0.0;
        assert!(config.validate().is_err());
        config.intensity.decay_per_sec = 1000.0;

        config.decision.threshold = 0.5;
        assert!(config.validate().is_err());
        config.decision.threshold = 0.1;

        config.risk.regimes.elevated_max = 0.1;
        assert!(config.validate().is_err());
        config.risk.regimes = RegimeTable::default();

        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
        config.logging.level = "debug".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_file() {
        let err = PipelineConfig::from_toml_str("[scheduler]\nslot_width_ns = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("slot_width_ns"));
    }

    #[test]
    fn test_toml_output_parses_back() {
        let cfg = PipelineConfig::default();
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[replay]\nseed = 7\n").unwrap();

        let cfg = PipelineConfig::load(&path).unwrap();
        assert_eq!(cfg.replay.seed, 7);
        assert!(PipelineConfig::load(dir.path().join("missing.toml")).is_err());
    }
}
