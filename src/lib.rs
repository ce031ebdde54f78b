//! Leveled, trace-correlated structured logging for server processes.
//!
//! Log calls and completed HTTP requests are turned into [`LogRecord`]s
//! that carry the request's trace id, span id, user id and scope, then
//! handed to a [`Sink`].

pub mod level;
pub mod value;
pub mod field;
pub mod context;
pub mod correlation;
pub mod env;
pub mod config;
pub mod record;
pub mod sink;
pub mod json_sink;
pub mod console_sink;
pub mod buffered;
pub mod noop_sink;
pub mod pipeline;
pub mod init;

#[cfg(feature = "axum")]
pub mod middleware;

pub use config::{BufferConfig, LoggerConfig};
pub use context::{LogContext, SpanContext, SpanId, TraceId, TraceProvider};
pub use field::{Field, FieldEncoder, FieldValue};
pub use level::Level;
pub use pipeline::Logger;
pub use record::{CallerSite, HttpRecord, LogRecord};
pub use sink::{AsyncSink, Sink, SinkError};
pub use value::Value;
