use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
/// Store events are emitted at `trace`, so `data` is lowered to `debug` only.
const DEFAULT_FILTER: &str = "info,data=debug";

/// Initialize tracing subscriber with sensible defaults and stderr writer.
/// - Respects `RUST_LOG` if set
/// - Falls back to `info,data=debug`
/// - Writes to stderr so command output on stdout stays machine readable
pub fn init_logging_default() {
    init_logging_with(DEFAULT_FILTER);
}

/// Same as [`init_logging_default`] with a caller supplied fallback filter.
pub fn init_logging_with(fallback: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_writer(io::stderr)
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, defaults to `info,data=debug`
/// - Emits one JSON object per event, including `correlation_id` fields
pub fn init_logging_json() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .json()
        .with_writer(io::stderr)
        .try_init();
}
