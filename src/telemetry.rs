use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing::Subscriber;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::{log_tracer::SetLoggerError, LogTracer};
use tracing_subscriber::{fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry};

/// Builds the `tracing` subscriber used by the service and by the integration tests.
///
/// The `Registry` stores span metadata and the relationships between spans,
/// and exposes them to the layers wrapping it. Spans and events go through:
/// - an `EnvFilter` read from `RUST_LOG`, or `fallback_env_filter` when it is not set
/// - a `JsonStorageLayer`, which keeps span fields available to child spans
/// - a bunyan JSON formatter writing to `sink`
///
/// # Arguments
/// - `name`: name of the app, added to every log record
/// - `fallback_env_filter`: filter used when `RUST_LOG` is not set, ex: `info`
/// - `sink`: where the records are written, ex: `std::io::stdout` or `std::io::sink`
///
/// # Returns
/// `impl Subscriber`: the concrete layered type is long to spell out
pub fn get_tracing_subscriber<Sink>(
    name: String,
    fallback_env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    // Higher-ranked trait bound: the sink is a `MakeWriter` whatever the lifetime `'a`
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_env_filter));

    // Reads the fields stored by `JsonStorageLayer`, outputs bunyan-compatible JSON records
    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        // Drops spans and events by level and target before any formatting
        .with(env_filter)
        // Stores span fields as JSON, and passes them from parent spans to their children
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Registers the subscriber as the global default, and redirects `log` records to it.
///
/// Can only succeed once per process.
pub fn init_tracing_subscriber(
    subscriber: impl Subscriber + Send + Sync,
) -> Result<(), TelemetryError> {
    // Redirects the `log` events of dependencies (ex: actix-web, rust-s3) to the subscriber
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to redirect log records to tracing: {0}")]
    LogTracerError(#[from] SetLoggerError),
    #[error("Failed to set the global tracing subscriber: {0}")]
    SubscriberError(#[from] SetGlobalDefaultError),
}
