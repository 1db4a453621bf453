//! Process-wide configuration.
//!
//! Settings are loaded once at initialization (from a JSON file or built
//! in code) and consumed when constructing the
//! [`PlatformContext`](crate::dispatch::PlatformContext) and the logging
//! facade. Unrecognized keys are rejected rather than silently ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{MiniapiError, MiniapiResult};
use crate::registry::FallbackPolicy;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Logging sinks, threshold, and format.
    pub log: LogConfig,

    /// Interval for the optional periodic telemetry sampler, in
    /// milliseconds. `None` means callers sample on demand only.
    pub telemetry_interval_ms: Option<u64>,

    /// Fallback-policy overrides by operation name (see [`crate::ops`]).
    /// An override replaces the static table's resolution for that
    /// operation, natively supported or not.
    pub fallback_overrides: HashMap<String, FallbackPolicy>,
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// Missing file is `NotFound`; malformed JSON or unrecognized keys are
    /// `InvalidArgument`.
    pub fn from_file(path: &Path) -> MiniapiResult<Config> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MiniapiError::from_io(e, "config.load", &path.display().to_string()))?;
        serde_json::from_str(&raw).map_err(|e| {
            MiniapiError::invalid_argument(format!("config {}: {e}", path.display()))
        })
    }

    /// The periodic sampling interval as a `Duration`, when configured.
    pub fn telemetry_interval(&self) -> Option<Duration> {
        self.telemetry_interval_ms.map(Duration::from_millis)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LogConfig {
    /// Destinations. Entries are applied in order; each may tighten the
    /// global threshold with its own `min_level`.
    pub sinks: Vec<SinkConfig>,

    /// Global minimum level.
    pub min_level: LogLevel,

    /// Output format shared by all sinks.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            sinks: vec![SinkConfig {
                kind: SinkKind::Console,
                path: None,
                min_level: None,
            }],
            min_level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

/// One log destination.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SinkConfig {
    /// Destination kind.
    pub kind: SinkKind,

    /// Target path; required for [`SinkKind::File`], ignored otherwise.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Per-sink threshold overriding the global one when stricter.
    #[serde(default)]
    pub min_level: Option<LogLevel>,
}

/// Log destination kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Standard error.
    Console,
    /// Append to a file.
    File,
    /// Platform-native event log (syslog on Unix, debugger output on
    /// Windows). Availability is resolved through the capability registry.
    Native,
}

/// Log severity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line text.
    Text,
    /// Structured JSON, one object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_logs_info_text_to_console() {
        let config = Config::default();
        assert_eq!(config.log.min_level, LogLevel::Info);
        assert_eq!(config.log.format, LogFormat::Text);
        assert_eq!(config.log.sinks.len(), 1);
        assert_eq!(config.log.sinks[0].kind, SinkKind::Console);
        assert!(config.telemetry_interval().is_none());
        assert!(config.fallback_overrides.is_empty());
    }

    #[test]
    fn parses_full_config() {
        let raw = r#"{
            "log": {
                "sinks": [
                    {"kind": "console"},
                    {"kind": "file", "path": "/tmp/miniapi.log", "min_level": "warn"}
                ],
                "min_level": "debug",
                "format": "json"
            },
            "telemetry_interval_ms": 250,
            "fallback_overrides": {
                "fs.remove_recursive": "emulate"
            }
        }"#;

        let config: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(config.log.sinks.len(), 2);
        assert_eq!(config.log.sinks[1].kind, SinkKind::File);
        assert_eq!(config.log.sinks[1].min_level, Some(LogLevel::Warn));
        assert_eq!(config.log.min_level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.telemetry_interval(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            config.fallback_overrides.get("fs.remove_recursive"),
            Some(&FallbackPolicy::Emulate)
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let raw = r#"{"log": {"colour": true}}"#;
        let result: Result<Config, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn from_file_maps_missing_to_not_found() {
        let err = Config::from_file(Path::new("/nonexistent/miniapi.json")).unwrap_err();
        assert!(matches!(err, MiniapiError::NotFound { .. }));
    }

    #[test]
    fn from_file_maps_bad_json_to_invalid_argument() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, MiniapiError::InvalidArgument { .. }));
    }

    #[test]
    fn from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"telemetry_interval_ms": 100}"#).unwrap();
        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(
            config.telemetry_interval(),
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn log_levels_order_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }
}
