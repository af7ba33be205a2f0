use domscript_core::LoggingConfig;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

/// Install the global subscriber described by `[logging]`.
///
/// `RUST_LOG` wins over the configured level. Logs go to stderr so that
/// command output on stdout stays machine-readable.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => tracing::subscriber::set_global_default(
            Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            ),
        ),
        "compact" => tracing::subscriber::set_global_default(
            Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            ),
        ),
        _ => tracing::subscriber::set_global_default(
            Registry::default().with(env_filter).with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            ),
        ),
    };

    // Already installed (tests, embedding binaries)
    result.ok();
}
