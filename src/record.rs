use crate::field::Field;
use crate::level::Level;
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::panic::Location;
use std::time::Duration;

pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const TRACE_SAMPLED_KEY: &str = "logging.googleapis.com/trace_sampled";
pub const HTTP_REQUEST_KEY: &str = "httpRequest";
pub const STACKTRACE_KEY: &str = "stacktrace";

/// A finished record as handed to a [`crate::sink::Sink`].
///
/// Serializes as a flat JSON object: `severity`, `timestamp`, `message`,
/// then every field in order. Repeated keys are written repeatedly.
/// `caller` is not serialized; the JSON form carries it as the
/// [`SOURCE_LOCATION_KEY`] field.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub fields: Vec<Field>,
    pub caller: Option<CallerSite>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields,
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: CallerSite) -> Self {
        self.caller = Some(caller);
        self
    }

    /// First field stored under `key`.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.fields.len()))?;
        map.serialize_entry("severity", self.level.severity())?;
        map.serialize_entry("timestamp", &self.timestamp.to_rfc3339())?;
        map.serialize_entry("message", &self.message)?;
        for field in &self.fields {
            map.serialize_entry(&field.key, &field.value.to_json())?;
        }
        map.end()
    }
}

/// File and line of the code that issued a log call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallerSite {
    /// The caller of the enclosing `#[track_caller]` function.
    #[track_caller]
    pub fn here() -> Self {
        Location::caller().into()
    }

    pub fn to_field(self) -> Field {
        Field::opaque(
            SOURCE_LOCATION_KEY,
            serde_json::json!({
                "file": self.file,
                "line": self.line.to_string(),
            }),
        )
    }
}

impl From<&'static Location<'static>> for CallerSite {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

impl std::fmt::Display for CallerSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One completed HTTP exchange, as seen by the access-log middleware.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpRecord {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub remote_ip: String,
    /// Matched route template, empty when no route matched.
    pub route: String,
    pub latency: Duration,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub protocol: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpPayload<'a> {
    request_method: &'a str,
    request_url: &'a str,
    status: u16,
    remote_ip: &'a str,
    latency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    referer: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    protocol: Option<&'a str>,
}

impl HttpRecord {
    /// Latency as a human-readable duration, e.g. `1.5ms`.
    pub fn latency_string(&self) -> String {
        format!("{:?}", self.latency)
    }

    pub fn to_field(&self) -> Field {
        let payload = HttpPayload {
            request_method: &self.method,
            request_url: &self.url,
            status: self.status,
            remote_ip: &self.remote_ip,
            latency: self.latency_string(),
            user_agent: self.user_agent.as_deref(),
            referer: self.referer.as_deref(),
            protocol: self.protocol.as_deref(),
        };
        let value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
        Field::opaque(HTTP_REQUEST_KEY, value)
    }
}
