use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber
///
/// `RUST_LOG` wins over `log_level` when set. Returns false if a subscriber
/// was already installed (tests, or a host application).
pub fn init_logger(log_level: &str, json_logs: bool) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let result = if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(true).with_thread_names(true))
            .try_init()
    };

    result.is_ok()
}

/// Initialize from the `[logging]` config section
pub fn init_from_config(config: &LoggingConfig) -> bool {
    init_logger(&config.level, config.json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init_logger("debug", false);
        assert!(!init_logger("info", true));
    }
}
