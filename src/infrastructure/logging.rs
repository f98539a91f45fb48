use tracing_subscriber::EnvFilter;

/// Initialise logging at the configured level. `RUST_LOG`, when set and valid,
/// takes precedence.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter_for(level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}
