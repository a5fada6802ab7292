//! Structured logging initialisation for host processes.
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the host's choice. [`initialise`] installs one configured from
//! [`MapperConfig`] and is safe to call more than once.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use transmap_config::{LogFormat, MapperConfig};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global tracing subscriber on first use.
///
/// Later calls return a fresh [`TelemetryHandle`] without touching the
/// global subscriber, even when their configuration differs.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the log filter does not parse and
/// [`TelemetryError::Subscriber`] when another subscriber is already
/// installed globally.
///
/// # Examples
///
/// ```rust
/// use transmap::telemetry;
/// use transmap_config::MapperConfig;
///
/// # fn main() -> Result<(), transmap::telemetry::TelemetryError> {
/// let config = MapperConfig::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// drop(first);
/// drop(second);
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &MapperConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn install_subscriber(config: &MapperConfig) -> Result<(), TelemetryError> {
    let filter = parse_filter(config.log_filter())?;
    let format = config.log_format();

    // Mapping calls run on the host's worker threads; name them in records.
    let builder = |filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_writer(io::stderr)
            .with_ansi(!format.is_structured() && io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    info!(
        target: TELEMETRY_TARGET,
        %format,
        filter = config.log_filter(),
        "telemetry initialised"
    );
    Ok(())
}

fn parse_filter(directives: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(directives).map_err(|error| TelemetryError::Filter(error.to_string()))
}
