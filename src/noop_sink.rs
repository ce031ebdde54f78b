use crate::record::LogRecord;
use crate::sink::{AsyncSink, Sink, SinkError};
use async_trait::async_trait;
use std::error::Error;

/// A sink that simply drops all records.
///
/// Useful for measuring the overhead of the pipeline itself without any
/// I/O, and for tests that don't care about output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl Sink for NoopSink {
    fn submit(&self, _record: LogRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

#[async_trait]
impl AsyncSink for NoopSink {
    async fn send(&self, _record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}
