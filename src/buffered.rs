use crate::config::BufferConfig;
use crate::record::LogRecord;
use crate::sink::{AsyncSink, Sink, SinkError};
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Duration, Instant, MissedTickBehavior};

const MAX_SEND_ATTEMPTS: u32 = 5;

/// [`Sink`] that forwards records to an asynchronous [`AsyncSink`] via a
/// bounded channel and a background task.
///
/// `submit` never blocks: when the channel is full the record is dropped
/// and counted. The background task batches records, sends a partial
/// batch at least every `flush_interval`, and retries failed sends with
/// exponential backoff.
///
/// Flush requests travel on their own unbounded channel, so a flush is
/// accepted even while the record channel is full. The task drains every
/// record queued before the request before acknowledging it.
pub struct BufferedSink {
    records: mpsc::Sender<LogRecord>,
    flushes: mpsc::UnboundedSender<std_mpsc::Sender<()>>,
    flush_timeout: Duration,
    /// Total records submitted.
    pub total_records: Arc<AtomicU64>,
    /// Successfully enqueued into the channel.
    pub enqueued_records: Arc<AtomicU64>,
    /// Dropped because the channel was full or closed.
    pub dropped_records: Arc<AtomicU64>,
}

impl BufferedSink {
    /// Create the sink and spawn its background task on the current Tokio
    /// runtime.
    ///
    /// `flush` blocks the calling thread until the task has drained the
    /// queue, so on a current-thread runtime it can only time out.
    pub fn new(backend: Arc<dyn AsyncSink>, config: BufferConfig) -> (Self, JoinHandle<()>) {
        let config = config.clamped();
        let batch_size = config.batch_size;
        let flush_interval = config.flush_interval;

        let (tx, mut rx) = mpsc::channel::<LogRecord>(config.channel_buffer);
        let (flush_tx, mut flush_rx) = mpsc::unbounded_channel::<std_mpsc::Sender<()>>();

        let handle = tokio::spawn(async move {
            let mut batch = Vec::with_capacity(batch_size);
            let mut ticker = interval_at(Instant::now() + flush_interval, flush_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    record = rx.recv() => match record {
                        Some(record) => {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                if let Err(e) = send_batch(&*backend, &mut batch).await {
                                    eprintln!("error sending log batch: {}", e);
                                }
                            }
                        }
                        None => {
                            if let Err(e) = send_batch(&*backend, &mut batch).await {
                                eprintln!("error sending final log batch: {}", e);
                            }
                            break;
                        }
                    },
                    Some(ack) = flush_rx.recv() => {
                        while let Ok(record) = rx.try_recv() {
                            batch.push(record);
                            if batch.len() >= batch_size {
                                if let Err(e) = send_batch(&*backend, &mut batch).await {
                                    eprintln!("error sending log batch: {}", e);
                                }
                            }
                        }
                        if let Err(e) = send_batch(&*backend, &mut batch).await {
                            eprintln!("error flushing log batch: {}", e);
                        }
                        if let Err(e) = backend.flush().await {
                            eprintln!("error flushing log backend: {}", e);
                        }
                        let _ = ack.send(());
                    }
                    _ = ticker.tick() => {
                        if !batch.is_empty() {
                            if let Err(e) = send_batch(&*backend, &mut batch).await {
                                eprintln!("error flushing log batch: {}", e);
                            }
                        }
                    }
                }
            }
        });

        (
            Self {
                records: tx,
                flushes: flush_tx,
                flush_timeout: config.flush_timeout,
                total_records: Arc::new(AtomicU64::new(0)),
                enqueued_records: Arc::new(AtomicU64::new(0)),
                dropped_records: Arc::new(AtomicU64::new(0)),
            },
            handle,
        )
    }
}

/// Send every record in `batch`, resuming from the failed record on
/// retry. The batch is cleared whether or not it was delivered.
async fn send_batch(
    backend: &dyn AsyncSink,
    batch: &mut Vec<LogRecord>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let mut backoff = Duration::from_millis(100);
    let max_backoff = Duration::from_secs(10);
    let mut sent = 0;
    let mut attempt = 1;

    while sent < batch.len() {
        match backend.send(&batch[sent]).await {
            Ok(()) => sent += 1,
            Err(e) if attempt >= MAX_SEND_ATTEMPTS => {
                let lost = batch.len() - sent;
                batch.clear();
                return Err(format!("giving up on {} records: {}", lost, e).into());
            }
            Err(_) => {
                eprintln!("log backend send failed, retrying in {:?}", backoff);
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
                attempt += 1;
            }
        }
    }

    batch.clear();
    Ok(())
}

impl Sink for BufferedSink {
    fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        self.total_records.fetch_add(1, Ordering::Relaxed);
        match self.records.try_send(record) {
            Ok(()) => {
                self.enqueued_records.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped_records.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.dropped_records.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Closed)
            }
        }
    }

    fn flush(&self) -> Result<(), SinkError> {
        let (ack_tx, ack_rx) = std_mpsc::channel();
        self.flushes.send(ack_tx).map_err(|_| SinkError::Closed)?;
        ack_rx.recv_timeout(self.flush_timeout).map_err(|e| match e {
            std_mpsc::RecvTimeoutError::Timeout => SinkError::FlushTimeout,
            std_mpsc::RecvTimeoutError::Disconnected => SinkError::Closed,
        })
    }
}
