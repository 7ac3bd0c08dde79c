//! Logging setup for applications built on the FOLIO client
//!
//! The client crates only emit `tracing` events. An application calls
//! [`init`] or [`init_with_config`] once at startup to install a subscriber
//! that prints them. `RUST_LOG` overrides the configured level.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with the default configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init() -> anyhow::Result<()> {
    init_with_config(&TelemetryConfig::default())
}

/// Initialize logging with a custom configuration
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_with_config(config: &TelemetryConfig) -> anyhow::Result<()> {
    let json = config.json.then(|| {
        fmt::layer()
            .json()
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
    });
    let compact = (!config.json).then(|| {
        fmt::layer()
            .with_target(config.show_target)
            .with_thread_ids(config.show_thread_ids)
            .with_file(config.show_file)
            .with_line_number(config.show_line_number)
            .compact()
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(json)
        .with(compact);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// `RUST_LOG` if set and valid, the configured level otherwise
fn env_filter(config: &TelemetryConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Get the current session ID
#[must_use]
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive, e.g. `info` or `warn,folio_client=debug`
    pub log_level: String,
    /// Emit one JSON object per event instead of compact text
    pub json: bool,
    /// Include the event target
    pub show_target: bool,
    /// Include thread IDs
    pub show_thread_ids: bool,
    /// Include source file names
    pub show_file: bool,
    /// Include source line numbers
    pub show_line_number: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl TelemetryConfig {
    /// Builder-style method to set the filter directive
    #[must_use]
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Builder-style method to switch to JSON output
    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.log_level, "info");
        assert!(!config.json);
        assert!(!config.show_target);
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: TelemetryConfig =
            serde_json::from_str(r#"{"log_level": "debug", "json": true}"#).unwrap();
        assert_eq!(
            config,
            TelemetryConfig::default().with_log_level("debug").with_json(true)
        );
    }

    #[test]
    fn test_init_only_once() {
        let config = TelemetryConfig::default().with_log_level("warn,folio_client=debug");
        let _ = init_with_config(&config);
        assert!(init_with_config(&config).is_err());
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(id, session_id());
    }
}
