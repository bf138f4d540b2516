//! Diagnostic logging.
//!
//! The terminal belongs to the kiosk UI, so tracing output goes to a log file
//! (default: `~/.local/share/kiosk-pin/kiosk.log`). `RUST_LOG` overrides the
//! configured filter.

use crate::config::{expand_home, LoggingConfig};
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resolved log file location.
pub fn log_path(config: &LoggingConfig) -> PathBuf {
    expand_home(&config.file)
}

fn filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber writing to the configured file.
pub fn init(config: &LoggingConfig) -> Result<PathBuf> {
    let path = log_path(config);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(path)
}

/// Subscriber for one-shot CLI commands, which own the terminal.
pub fn init_stderr(config: &LoggingConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(config))
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_expands_home() {
        let cfg = LoggingConfig {
            file: "/var/log/kiosk-pin.log".into(),
            level: "debug".into(),
        };
        assert_eq!(log_path(&cfg), PathBuf::from("/var/log/kiosk-pin.log"));
    }

    #[test]
    fn test_bad_level_falls_back() {
        let cfg = LoggingConfig {
            file: "k.log".into(),
            level: "not a [valid filter".into(),
        };
        // Must not panic regardless of RUST_LOG.
        let _ = filter(&cfg);
    }
}
