//! The logging pipeline.
//!
//! # Data Flow
//! ```text
//! call site (level, message, key/values)
//!     → level check against the configured threshold (stop here if filtered)
//!     → correlation fields from the LogContext
//!     → encoded key/value fields
//!     → LogRecord → Sink
//! ```
//!
//! Access-log records from the middleware take the same path through
//! [`Logger::http`] but are always written at info level.

use crate::config::{LoggerConfig, OutputMode};
use crate::context::{ContextTraceProvider, LogContext, TraceProvider};
use crate::correlation::{Correlation, CorrelationExtractor};
use crate::field::{Field, FieldEncoder};
use crate::level::{should_emit, Level};
use crate::record::{
    CallerSite, HttpRecord, LogRecord, SPAN_ID_KEY, STACKTRACE_KEY, TRACE_KEY,
    TRACE_SAMPLED_KEY,
};
use crate::sink::{Sink, SinkError};
use crate::value::Value;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;

const REMOTE_IP_KEY: &str = "remote_ip";
const ROUTE_KEY: &str = "route";
const HTTP_MESSAGE: &str = "request log";

/// Called after a critical record has been written and the sink flushed.
pub type FatalHook = Arc<dyn Fn() + Send + Sync>;

/// Leveled, context-correlated logger.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and the
/// logger holds no mutable state.
pub struct Logger {
    config: Arc<LoggerConfig>,
    sink: Arc<dyn Sink>,
    correlation: CorrelationExtractor,
    encoder: FieldEncoder,
    on_fatal: FatalHook,
}

/// Builder for [`Logger`]. Unset parts fall back to the defaults used by
/// [`crate::init::init`].
pub struct LoggerBuilder {
    config: LoggerConfig,
    sink: Option<Arc<dyn Sink>>,
    trace_provider: Option<Arc<dyn TraceProvider>>,
    on_fatal: Option<FatalHook>,
}

impl LoggerBuilder {
    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn trace_provider(mut self, provider: Arc<dyn TraceProvider>) -> Self {
        self.trace_provider = Some(provider);
        self
    }

    /// Replace the default fatal action (`std::process::exit(1)`).
    pub fn on_fatal(mut self, hook: FatalHook) -> Self {
        self.on_fatal = Some(hook);
        self
    }

    pub fn build(self) -> Logger {
        let sink = self
            .sink
            .unwrap_or_else(|| crate::init::default_sink(&self.config));
        let provider = self
            .trace_provider
            .unwrap_or_else(|| Arc::new(ContextTraceProvider) as Arc<dyn TraceProvider>);
        let on_fatal = self
            .on_fatal
            .unwrap_or_else(|| {
                Arc::new(|| {
                    std::process::exit(1);
                }) as FatalHook
            });
        Logger {
            encoder: FieldEncoder::new(self.config.key_error.clone()),
            correlation: CorrelationExtractor::new(provider),
            config: Arc::new(self.config),
            sink,
            on_fatal,
        }
    }
}

impl Logger {
    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder {
            config,
            sink: None,
            trace_provider: None,
            on_fatal: None,
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        should_emit(level, self.config.level)
    }

    /// Format and write a record.
    ///
    /// Nothing is formatted or extracted when `level` is filtered out.
    /// A [`Level::Critical`] record flushes the sink and then runs the
    /// fatal hook.
    pub fn log(&self, ctx: &LogContext, level: Level, caller: CallerSite, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let message = fmt::format(args);
        let fields = self.context_fields(ctx, caller);
        self.emit(level, message, fields, Some(caller));
    }

    /// Write a record with a fixed message and extra key/value fields,
    /// appended after the correlation fields.
    pub fn logw<'a, I>(
        &self,
        ctx: &LogContext,
        level: Level,
        caller: CallerSite,
        message: &str,
        keys_and_values: I,
    ) where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        if !self.enabled(level) {
            return;
        }
        let mut fields = self.context_fields(ctx, caller);
        fields.extend(self.encoder.encode(keys_and_values));
        self.emit(level, message.to_string(), fields, Some(caller));
    }

    /// Write an access-log record. Always at info level, regardless of the
    /// configured threshold.
    pub fn http(&self, ctx: &LogContext, request: &HttpRecord) {
        let correlation = self.correlation.extract(ctx);
        let mut fields = vec![
            request.to_field(),
            Field::string(&self.config.key_request_id, correlation.trace_id.clone()),
            Field::string(REMOTE_IP_KEY, request.remote_ip.clone()),
            Field::string(ROUTE_KEY, request.route.clone()),
        ];
        self.push_trace_and_identity(&mut fields, correlation);
        self.emit(Level::Info, HTTP_MESSAGE.to_string(), fields, None);
    }

    #[track_caller]
    pub fn critical(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::Critical, CallerSite::here(), args);
    }

    #[track_caller]
    pub fn error(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::Error, CallerSite::here(), args);
    }

    #[track_caller]
    pub fn errorw<'a, I>(&self, ctx: &LogContext, message: &str, keys_and_values: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(ctx, Level::Error, CallerSite::here(), message, keys_and_values);
    }

    #[track_caller]
    pub fn warn(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::Warn, CallerSite::here(), args);
    }

    #[track_caller]
    pub fn warnw<'a, I>(&self, ctx: &LogContext, message: &str, keys_and_values: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(ctx, Level::Warn, CallerSite::here(), message, keys_and_values);
    }

    #[track_caller]
    pub fn info(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::Info, CallerSite::here(), args);
    }

    #[track_caller]
    pub fn infow<'a, I>(&self, ctx: &LogContext, message: &str, keys_and_values: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(ctx, Level::Info, CallerSite::here(), message, keys_and_values);
    }

    #[track_caller]
    pub fn debug(&self, ctx: &LogContext, args: fmt::Arguments<'_>) {
        self.log(ctx, Level::Debug, CallerSite::here(), args);
    }

    #[track_caller]
    pub fn debugw<'a, I>(&self, ctx: &LogContext, message: &str, keys_and_values: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.logw(ctx, Level::Debug, CallerSite::here(), message, keys_and_values);
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        self.sink.flush()
    }

    fn context_fields(&self, ctx: &LogContext, caller: CallerSite) -> Vec<Field> {
        let correlation = self.correlation.extract(ctx);
        let mut fields = vec![
            Field::string(&self.config.key_request_id, correlation.trace_id.clone()),
            caller.to_field(),
        ];
        self.push_trace_and_identity(&mut fields, correlation);
        fields
    }

    fn push_trace_and_identity(&self, fields: &mut Vec<Field>, correlation: Correlation) {
        if !self.config.project_id.is_empty() {
            fields.push(Field::string(
                TRACE_KEY,
                format!(
                    "projects/{}/traces/{}",
                    self.config.project_id, correlation.trace_id
                ),
            ));
            fields.push(Field::string(SPAN_ID_KEY, correlation.span_id));
            fields.push(Field::opaque(TRACE_SAMPLED_KEY, serde_json::Value::Bool(true)));
        }
        if let Some(user_id) = correlation.user_id {
            fields.push(Field::string(&self.config.key_user_id, user_id));
        }
        if let Some(scope) = correlation.scope {
            fields.push(Field::string(&self.config.key_scope, scope));
        }
    }

    fn emit(
        &self,
        level: Level,
        message: String,
        mut fields: Vec<Field>,
        caller: Option<CallerSite>,
    ) {
        if matches!(level, Level::Critical | Level::Error)
            && self.config.output_mode() == OutputMode::Console
        {
            fields.push(Field::string(
                STACKTRACE_KEY,
                Backtrace::force_capture().to_string(),
            ));
        }
        let mut record = LogRecord::new(level, message, fields);
        record.caller = caller;

        if level != Level::Critical {
            if let Err(e) = self.sink.submit(record) {
                eprintln!("ctxlog: dropping {} record: {}", level, e);
            }
            return;
        }

        // A full sink gets one flush to make room for the final record.
        let retry = record.clone();
        let submitted = match self.sink.submit(record) {
            Err(SinkError::Full) => self.sink.flush().and_then(|()| self.sink.submit(retry)),
            other => other,
        };
        if let Err(e) = submitted {
            eprintln!("ctxlog: dropping {} record: {}", level, e);
        }
        if let Err(e) = self.sink.flush() {
            eprintln!("ctxlog: flush before fatal exit failed: {}", e);
        }
        (self.on_fatal)();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
