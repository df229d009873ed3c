pub mod metrics;

pub use metrics::{LiveMetrics, MetricsSnapshot};

/// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns an error string if a global subscriber is already set.
#[cfg(feature = "tracing-basic")]
pub fn init_tracing() -> Result<(), String> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| e.to_string())
}
