#![forbid(unsafe_code)]

//! Logging setup shared by native hosts, tests, and the wasm shell.
//!
//! The core only emits `tracing` events; installing a subscriber is the
//! host's job. Native hosts call [`init`] (feature `native-logging`), which
//! reads its filter from `TACTILE_LOG`. The wasm shell has no environment and
//! resolves a level from a `log=` query parameter with [`level_from_str`].

use tracing::Level;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "TACTILE_LOG";

/// Level used when no directive is given.
pub const DEFAULT_LEVEL: Level = Level::INFO;

/// Parse a bare level name (`trace` … `error`, case-insensitive).
#[must_use]
pub fn level_from_str(s: &str) -> Option<Level> {
    s.trim().parse().ok()
}

/// Subscriber installation failure.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Install a global `fmt` subscriber filtered by [`LOG_ENV`].
///
/// Emits JSON lines with the `tracing-json` feature.
#[cfg(feature = "native-logging")]
pub fn init() -> Result<(), LoggingError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Registry};

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL.as_str().to_ascii_lowercase()));

    #[cfg(feature = "tracing-json")]
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);
    #[cfg(not(feature = "tracing-json"))]
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}
