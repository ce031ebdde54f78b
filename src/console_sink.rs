use crate::level::Level;
use crate::record::{LogRecord, SOURCE_LOCATION_KEY, STACKTRACE_KEY};
use crate::sink::{Sink, SinkError};
use std::fmt::Write as _;

/// Local-mode sink: re-emits every record as a `tracing` event so the
/// installed `fmt` subscriber renders it as colored text.
///
/// Fields are flattened into a single `fields` value of `key=value`
/// pairs, in record order. The source location shows as
/// `caller=file:line` and a stacktrace goes on the lines after the pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

fn render_fields(record: &LogRecord) -> String {
    let mut out = String::new();
    let mut stacktrace = None;
    for field in &record.fields {
        if field.key == STACKTRACE_KEY {
            stacktrace = Some(&field.value);
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        match record.caller {
            Some(caller) if field.key == SOURCE_LOCATION_KEY => {
                let _ = write!(out, "caller={}", caller);
            }
            _ => {
                let _ = write!(out, "{}={}", field.key, field.value);
            }
        }
    }
    if let Some(trace) = stacktrace {
        let _ = write!(out, "\n{}", trace);
    }
    out
}

impl Sink for ConsoleSink {
    fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        let fields = render_fields(&record);
        let message = record.message.as_str();
        match record.level {
            Level::Critical => {
                tracing::error!(target: "ctxlog", critical = true, fields = %fields, "{}", message)
            }
            Level::Error => tracing::error!(target: "ctxlog", fields = %fields, "{}", message),
            Level::Warn => tracing::warn!(target: "ctxlog", fields = %fields, "{}", message),
            Level::Info => tracing::info!(target: "ctxlog", fields = %fields, "{}", message),
            Level::Debug | Level::First | Level::Last => {
                tracing::debug!(target: "ctxlog", fields = %fields, "{}", message)
            }
        }
        Ok(())
    }
}
