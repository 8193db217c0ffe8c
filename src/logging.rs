//! Structured logging setup.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogFormat};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// actix-web's access logger writes through the `log` crate; those records
/// are forwarded into tracing by the subscriber's log bridge.
pub fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(true).with_line_number(false))
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {e}");
        return;
    }

    tracing::info!(
        level = %config.log_level,
        json = config.log_format == LogFormat::Json,
        "Logging initialized"
    );
}
