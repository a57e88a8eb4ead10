use std::io::IsTerminal;
use std::sync::OnceLock;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Errors emitted when configuring the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
}

/// Configures the global tracing subscriber.
///
/// The filter honours `RUST_LOG` and defaults to `info`. Embedders that
/// install their own subscriber can skip this entirely; the library only
/// emits events.
pub fn init_tracing() -> Result<(), TelemetryError> {
    INITIALISED
        .set(())
        .map_err(|_| TelemetryError::AlreadyInitialised)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());
    Registry::default().with(filter).with(fmt_layer).init();

    Ok(())
}

/// Ensures tracing has been initialised for the current process, tolerating
/// repeat calls from parallel tests or multiple embedders.
pub fn ensure_tracing() {
    let _ = init_tracing();
}
