//! Logging initialization.
//!
//! Uses `tracing-subscriber` with human-readable or JSON output. Logs go to
//! stderr so captions and reports printed to stdout stay pipeable.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global subscriber.
///
/// `RUST_LOG` overrides the level chosen here.
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Pick the level from the config file, with `--verbose` forcing debug.
pub fn effective_level(config: &captioner_core::Config, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        match config.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => config.logging.level.as_str(),
            _ => "info",
        }
    }
}

/// Initialize logging from the `[logging]` config section and CLI flags.
pub fn init_from_config(config: &captioner_core::Config, verbose: bool, json_logs: bool) {
    let json_format = json_logs || config.logging.format == "json";
    init(effective_level(config, verbose), json_format);
}

#[cfg(test)]
mod tests {
    use super::*;
    use captioner_core::Config;

    #[test]
    fn test_verbose_forces_debug() {
        let config = Config::default();
        assert_eq!(effective_level(&config, true), "debug");
        assert_eq!(effective_level(&config, false), "info");
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert_eq!(effective_level(&config, false), "info");
        config.logging.level = "warn".to_string();
        assert_eq!(effective_level(&config, false), "warn");
    }
}
