//! Tracing subscriber initialisation for embedding processes.
//!
//! The control crates only emit events; installing a subscriber is the
//! embedding process's job.  [`init_tracing`] wires up `tracing-subscriber`
//! with an environment-driven filter and output format.  Call it once at
//! process startup, before the control loop spawns.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `MIMIC_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//!
//! # Example
//!
//! ```rust,no_run
//! mimic_runtime::telemetry::init_tracing();
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global `tracing` subscriber.
///
/// Honours `RUST_LOG` for filtering (default `info`) and switches to
/// newline-delimited JSON output when `MIMIC_LOG_FORMAT=json`.  Must be
/// called at most once per process; a second call panics because the global
/// subscriber is already installed.
pub fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json_format_enabled() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }
}

/// `true` when `MIMIC_LOG_FORMAT=json` is set in the environment.
fn json_format_enabled() -> bool {
    std::env::var("MIMIC_LOG_FORMAT").as_deref() == Ok("json")
}
