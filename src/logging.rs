use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "ehsebo=info";

/// Installs the global fmt subscriber. `RUST_LOG` wins over the default directive.
pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // Another subscriber may already be installed by the host; keep it.
    let _ = fmt().with_env_filter(filter).try_init();
}
