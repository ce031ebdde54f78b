use crate::record::LogRecord;
use async_trait::async_trait;
use std::error::Error;

/// Destination for finished [`LogRecord`]s.
///
/// The logger calls `submit` in-line on the logging thread and never
/// serializes calls itself, so implementations must accept concurrent
/// submissions. `flush` runs at shutdown and right before a fatal exit.
pub trait Sink: Send + Sync {
    /// Hand one record to the sink.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was written or queued.
    /// - `Err(..)` if it was lost. The logger reports the error on stderr
    ///   and carries on; it does not retry.
    fn submit(&self, record: LogRecord) -> Result<(), SinkError>;

    /// Push any buffered records to their destination.
    ///
    /// Default implementation is a no-op.
    fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Asynchronous backend for [`LogRecord`]s, driven by
/// [`crate::buffered::BufferedSink`].
///
/// Implementations are responsible for transporting records to a concrete
/// backend (a log collector, a database, an HTTP ingestion API). `send`
/// is called from a background task, never on the application thread.
#[async_trait]
pub trait AsyncSink: Send + Sync {
    /// Send a single log record to the underlying backend.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was accepted by the backend.
    /// - `Err(..)` if the backend failed. The batch is retried with
    ///   backoff.
    async fn send(&self, record: &LogRecord) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Flush any buffered records, if the backend implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Error type returned by [`Sink`] implementations.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("sink buffer full, record dropped")]
    Full,

    #[error("sink background task has stopped")]
    Closed,

    #[error("flush did not complete in time")]
    FlushTimeout,

    #[error("backend error: {0}")]
    Backend(Box<dyn Error + Send + Sync>),
}
