use tracing_subscriber::{fmt, EnvFilter};

/// Installs the stderr subscriber once per process. `RUST_LOG` wins; the
/// fallback keeps the sync pipeline at the requested level while quieting the
/// chatty transport and pool internals.
pub fn init_logging(default_level: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let fallback = format!("{default_level},hyper=warn,reqwest=warn,sqlx=warn");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
