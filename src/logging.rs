use tracing_subscriber::EnvFilter;

/// Diagnostics go to stderr so the night report on stdout stays clean.
/// `SALT_LOG` takes precedence over `RUST_LOG`; the default level is `warn`.
pub fn init() {
    let filter = std::env::var("SALT_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
