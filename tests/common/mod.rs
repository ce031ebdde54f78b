//! Shared test doubles for the integration tests.

use ctxlog::context::{ContextTraceProvider, LogContext, SpanContext, TraceProvider};
use ctxlog::{LogRecord, Logger, LoggerConfig, Sink, SinkError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Sink that keeps every record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
    pub flushes: AtomicUsize,
}

#[allow(dead_code)]
impl MemorySink {
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Sink for MemorySink {
    fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }

    fn flush(&self) -> Result<(), SinkError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Trace provider that counts how often it is consulted.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
}

impl TraceProvider for CountingProvider {
    fn span_context(&self, ctx: &LogContext) -> SpanContext {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ContextTraceProvider.span_context(ctx)
    }
}

/// Logger wired to a [`MemorySink`] whose fatal hook only counts.
#[allow(dead_code)]
pub struct Harness {
    pub logger: Arc<Logger>,
    pub sink: Arc<MemorySink>,
    pub provider: Arc<CountingProvider>,
    pub fatal_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
pub fn harness(config: LoggerConfig) -> Harness {
    let sink = Arc::new(MemorySink::default());
    let provider = Arc::new(CountingProvider::default());
    let fatal_calls = Arc::new(AtomicUsize::new(0));
    let hook_calls = fatal_calls.clone();
    let logger = Logger::builder(config)
        .sink(sink.clone())
        .trace_provider(provider.clone())
        .on_fatal(Arc::new(move || {
            hook_calls.fetch_add(1, Ordering::SeqCst);
        }))
        .build();
    Harness {
        logger: Arc::new(logger),
        sink,
        provider,
        fatal_calls,
    }
}
