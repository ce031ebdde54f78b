use crate::env::{
    CTXLOG_DEVELOPMENT_ENV, CTXLOG_KEY_ERROR_ENV, CTXLOG_KEY_REQUEST_ID_ENV,
    CTXLOG_KEY_SCOPE_ENV, CTXLOG_KEY_USER_ID_ENV, CTXLOG_LEVEL_ENV, CTXLOG_PROJECT_ID_ENV,
};
use crate::level::{Level, ParseLevelError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide logger configuration.
///
/// Built once at startup and shared read-only (behind an `Arc`) by the
/// logger and the access-log middleware.
///
/// **Fields**
/// - `project_id`: cloud project the trace ids belong to. Empty means
///   local console output and no trace-context fields.
/// - `level`: threshold; records less severe than this are dropped.
/// - `development`: selects the development output format.
/// - `key_*`: field names of the well-known correlation keys.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub project_id: String,
    pub level: Level,
    pub development: bool,
    pub key_request_id: String,
    pub key_user_id: String,
    pub key_error: String,
    pub key_scope: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            level: Level::Debug,
            development: false,
            key_request_id: "request_id".to_string(),
            key_user_id: "user_id".to_string(),
            key_error: "err".to_string(),
            key_scope: "scope".to_string(),
        }
    }
}

/// Output format implied by a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Plain colored text, no cloud fields.
    Console,
    /// Pretty-printed Cloud Logging JSON.
    CloudDevelopment,
    /// One Cloud Logging JSON object per line.
    CloudProduction,
}

impl LoggerConfig {
    pub fn output_mode(&self) -> OutputMode {
        if self.project_id.is_empty() {
            OutputMode::Console
        } else if self.development {
            OutputMode::CloudDevelopment
        } else {
            OutputMode::CloudProduction
        }
    }

    /// Build a configuration from `CTXLOG_*` environment variables,
    /// falling back to [`LoggerConfig::default`] for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LoggerConfig::default();
        let level = match lookup(CTXLOG_LEVEL_ENV) {
            Some(raw) => raw.parse::<Level>()?,
            None => defaults.level,
        };
        let development = match lookup(CTXLOG_DEVELOPMENT_ENV) {
            Some(raw) => parse_bool(&raw)?,
            None => defaults.development,
        };
        Ok(Self {
            project_id: lookup(CTXLOG_PROJECT_ID_ENV).unwrap_or(defaults.project_id),
            level,
            development,
            key_request_id: lookup(CTXLOG_KEY_REQUEST_ID_ENV).unwrap_or(defaults.key_request_id),
            key_user_id: lookup(CTXLOG_KEY_USER_ID_ENV).unwrap_or(defaults.key_user_id),
            key_error: lookup(CTXLOG_KEY_ERROR_ENV).unwrap_or(defaults.key_error),
            key_scope: lookup(CTXLOG_KEY_SCOPE_ENV).unwrap_or(defaults.key_scope),
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool(raw.to_string())),
    }
}

/// Error type returned when building a [`LoggerConfig`] from the
/// environment.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Level(#[from] ParseLevelError),

    #[error("invalid boolean value: {0}")]
    InvalidBool(String),
}

/// Settings for [`crate::buffered::BufferedSink`].
///
/// **Fields**
/// - `channel_buffer`: maximum number of queued records before new ones
///   are dropped.
/// - `batch_size`: records handed to the backend per batch.
/// - `flush_interval`: longest time a partial batch waits.
/// - `flush_timeout`: how long a synchronous flush waits for the
///   background task to drain.
#[derive(Clone, Debug)]
pub struct BufferConfig {
    pub channel_buffer: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub flush_timeout: Duration,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 1024,
            batch_size: 128,
            flush_interval: Duration::from_secs(1),
            flush_timeout: Duration::from_secs(5),
        }
    }
}

impl BufferConfig {
    /// Apply minimum thresholds so degenerate values cannot stall the
    /// background task.
    pub fn clamped(self) -> Self {
        Self {
            channel_buffer: self.channel_buffer.max(16),
            batch_size: self.batch_size.max(1),
            flush_interval: self.flush_interval.max(Duration::from_millis(10)),
            flush_timeout: self.flush_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_keys() {
        let c = LoggerConfig::default();
        assert_eq!(c.level, Level::Debug);
        assert_eq!(c.key_request_id, "request_id");
        assert_eq!(c.key_user_id, "user_id");
        assert_eq!(c.key_error, "err");
        assert_eq!(c.key_scope, "scope");
        assert_eq!(c.output_mode(), OutputMode::Console);
    }

    #[test]
    fn output_mode_follows_project_and_development() {
        let mut c = LoggerConfig {
            project_id: "proj".into(),
            ..LoggerConfig::default()
        };
        assert_eq!(c.output_mode(), OutputMode::CloudProduction);
        c.development = true;
        assert_eq!(c.output_mode(), OutputMode::CloudDevelopment);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: LoggerConfig =
            serde_json::from_str(r#"{"project_id":"p","level":"warn","key_error":"error"}"#)
                .unwrap();
        assert_eq!(c.project_id, "p");
        assert_eq!(c.level, Level::Warn);
        assert_eq!(c.key_error, "error");
        assert_eq!(c.key_user_id, "user_id");
    }

    #[test]
    fn reads_environment_lookup() {
        let vars: HashMap<&str, &str> = [
            (CTXLOG_PROJECT_ID_ENV, "acme"),
            (CTXLOG_LEVEL_ENV, "3"),
            (CTXLOG_DEVELOPMENT_ENV, "true"),
            (CTXLOG_KEY_SCOPE_ENV, "tenant"),
        ]
        .into_iter()
        .collect();
        let c = LoggerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(c.project_id, "acme");
        assert_eq!(c.level, Level::Warn);
        assert!(c.development);
        assert_eq!(c.key_scope, "tenant");
        assert_eq!(c.key_request_id, "request_id");
    }

    #[test]
    fn rejects_bad_environment_values() {
        let bad_level = LoggerConfig::from_lookup(|k| {
            (k == CTXLOG_LEVEL_ENV).then(|| "loud".to_string())
        });
        assert!(matches!(bad_level, Err(ConfigError::Level(_))));

        let bad_bool = LoggerConfig::from_lookup(|k| {
            (k == CTXLOG_DEVELOPMENT_ENV).then(|| "maybe".to_string())
        });
        assert!(matches!(bad_bool, Err(ConfigError::InvalidBool(_))));
    }

    #[test]
    fn buffer_config_clamps_degenerate_values() {
        let c = BufferConfig {
            channel_buffer: 0,
            batch_size: 0,
            flush_interval: Duration::ZERO,
            flush_timeout: Duration::from_millis(1),
        }
        .clamped();
        assert_eq!(c.channel_buffer, 16);
        assert_eq!(c.batch_size, 1);
        assert_eq!(c.flush_interval, Duration::from_millis(10));
    }
}
