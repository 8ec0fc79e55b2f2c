use crate::cli::args::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "SWEEP_LOG";

/// Installs the global subscriber. Filter directives come from `SWEEP_LOG`
/// (default `info`); output always goes to stderr so stdout stays clean for
/// query results.
pub fn init_logging(format: LogFormat) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    match format {
        LogFormat::Json => fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
    }
}
