//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr so stdout stays reserved for command output
//! that workflows capture. The filter comes from `SISYPHUS_LOG`, then
//! `RUST_LOG`, defaulting to `warn`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "SISYPHUS_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Guard returned by [`init`]; held for the lifetime of `main`.
pub struct TelemetryGuard {
    _private: (),
}

fn build_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Set `SISYPHUS_LOG_FORMAT=json` for
/// machine-readable lines.
pub fn init() -> TelemetryGuard {
    let json = std::env::var("SISYPHUS_LOG_FORMAT").is_ok_and(|v| v == "json");

    let registry = tracing_subscriber::registry().with(build_filter());
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    // A subscriber may already be installed when running under a test harness.
    let _ = result;

    TelemetryGuard { _private: () }
}
