//! Logging context for the migration process
//!
//! The subscriber is built explicitly and installed as the default for the
//! calling thread. The returned [`LoggingGuard`] must be held for as long as
//! logging should stay active; dropping it uninstalls the subscriber.

use crate::config::LogFormat;
use tracing::dispatcher::{self, DefaultGuard, Dispatch};
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "ytmigrate=info";

/// Keeps the process logger installed while alive
pub struct LoggingGuard {
    _default: DefaultGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Build the subscriber for `format` without installing it.
pub fn build_dispatch(format: LogFormat) -> Dispatch {
    match format {
        LogFormat::Text => Dispatch::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(true)
                .finish(),
        ),
        LogFormat::Json => Dispatch::new(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(env_filter())
                .with_current_span(true)
                .finish(),
        ),
    }
}

/// Install the process logger on the current thread.
pub fn init(format: LogFormat) -> LoggingGuard {
    let dispatch = build_dispatch(format);
    LoggingGuard {
        _default: dispatcher::set_default(&dispatch),
    }
}
