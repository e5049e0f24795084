use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "NESTEGG_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Diagnostics go to stderr so stdout stays parseable with `--json`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    // A subscriber already installed (tests) is fine.
    let _ = tracing::subscriber::set_global_default(subscriber);
}
