use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Duration;

use ctxlog::buffered::BufferedSink;
use ctxlog::noop_sink::NoopSink;
use ctxlog::{kv, BufferConfig, LogContext, Logger, LoggerConfig, Sink};

#[tokio::main]
async fn main() {
    let buffer_config = BufferConfig {
        channel_buffer: 50_000,
        batch_size: 1_000,
        flush_interval: Duration::from_millis(200),
        ..BufferConfig::default()
    };
    let (sink, _handle) = BufferedSink::new(Arc::new(NoopSink), buffer_config);
    let sink = Arc::new(sink);

    let logger = Logger::builder(LoggerConfig::default())
        .sink(sink.clone())
        .build();
    let ctx = LogContext::new().with_scope("load");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        logger.errorw(&ctx, "load test error", kv!["iteration" => i]);
    }

    let elapsed = start.elapsed();
    println!("buffered: sent {} records in {:?} (~{:.0} rec/s), dropped {}",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64(),
        sink.dropped_records.load(Ordering::Relaxed),
    );

    // Flush blocks this thread, so hand it to the blocking pool.
    let flushed = tokio::task::spawn_blocking(move || sink.flush()).await;
    println!("flush: {:?}", flushed);
}
