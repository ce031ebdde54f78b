use crate::config::{LoggerConfig, OutputMode};
use crate::console_sink::ConsoleSink;
use crate::json_sink::JsonSink;
use crate::pipeline::Logger;
use crate::sink::Sink;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

static GLOBAL: OnceLock<Arc<Logger>> = OnceLock::new();

/// Held for the whole of an initialization, so the already-initialized
/// check, the subscriber install and the store happen as one step.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Error type returned by [`init`] and [`init_with_sink`].
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("logger already initialized")]
    AlreadyInitialized,

    #[error("failed to install console subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// The sink [`init`] uses for a configuration.
///
/// - no project id: [`ConsoleSink`], colored text via `tracing`
/// - project id + development: pretty-printed [`JsonSink`] on stdout
/// - project id: line-delimited [`JsonSink`] on stdout
pub fn default_sink(config: &LoggerConfig) -> Arc<dyn Sink> {
    match config.output_mode() {
        OutputMode::Console => Arc::new(ConsoleSink),
        OutputMode::CloudDevelopment => Arc::new(JsonSink::stdout(true)),
        OutputMode::CloudProduction => Arc::new(JsonSink::stdout(false)),
    }
}

/// Initialize the process-wide logger.
///
/// **Parameters**
/// - `config`: `None` means [`LoggerConfig::default`].
///
/// **Effects**
///
/// In console mode this installs a [`Registry`] with a `fmt` layer as the
/// global `tracing` subscriber, so it fails if another subscriber is
/// already installed. Use [`init_with_sink`] to keep an existing one.
pub fn init(config: Option<LoggerConfig>) -> Result<Arc<Logger>, InitError> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if GLOBAL.get().is_some() {
        return Err(InitError::AlreadyInitialized);
    }
    let config = config.unwrap_or_default();

    if config.output_mode() == OutputMode::Console {
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
        let subscriber = Registry::default().with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }

    let sink = default_sink(&config);
    install(Logger::builder(config).sink(sink).build())
}

/// Initialize the process-wide logger with an explicit sink. No `tracing`
/// subscriber is installed.
pub fn init_with_sink(
    config: Option<LoggerConfig>,
    sink: Arc<dyn Sink>,
) -> Result<Arc<Logger>, InitError> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    install(
        Logger::builder(config.unwrap_or_default())
            .sink(sink)
            .build(),
    )
}

fn install(logger: Logger) -> Result<Arc<Logger>, InitError> {
    let logger = Arc::new(logger);
    GLOBAL
        .set(logger.clone())
        .map_err(|_| InitError::AlreadyInitialized)?;
    Ok(logger)
}

/// The logger installed by [`init`], if any.
pub fn global() -> Option<Arc<Logger>> {
    GLOBAL.get().cloned()
}

/// Flush the global logger's sink. Call once during shutdown.
pub fn finalize() {
    if let Some(logger) = GLOBAL.get() {
        if let Err(e) = logger.flush() {
            eprintln!("ctxlog: flush on shutdown failed: {}", e);
        }
    }
}
