use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HOOKGATE_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Diagnostics go to stderr only; stdout belongs to the host.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
