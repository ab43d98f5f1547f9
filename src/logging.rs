use tracing_subscriber::EnvFilter;

/// Install the process-wide log subscriber. `color` toggles ANSI output
/// and maps straight from `ServerConfig::color_output`; verbosity comes
/// from `RUST_LOG` with an `info` default. Safe to call more than once —
/// later installs are ignored.
pub fn init_logging(color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(color)
        .try_init();
}
