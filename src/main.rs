//! Stowage server entry point.
//!
//! Loads configuration, installs logging and hands over to the API crate.
//! The `stowage` CLI offers the same server under `stowage serve` plus the
//! admin commands.

use tracing_subscriber::{EnvFilter, fmt};

use stowage_core::config::AppConfig;
use stowage_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = stowage_api::run_server(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load configuration from file, environment overlay and `STOWAGE__*` vars.
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("STOWAGE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
    let env = std::env::var("STOWAGE_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_current_span(false)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}
