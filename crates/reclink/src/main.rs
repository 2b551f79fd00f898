//! Reclink: console host for the recorder session client.

mod app;
mod app_command;
mod config;
mod error;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use reclink_core::RecorderClient;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Application entry point.
fn main() {
    let config_path = match Config::path_from_args(std::env::args().skip(1)) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    // Logging level comes from the config, so it is loaded before tracing is up.
    let config = match Config::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config.client.debug_logging))
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let client = RecorderClient::spawn(config.client);
        let notifications = client.notifications();

        let app = App {
            client,
            notifications,
        };

        if let Err(e) = app.run().await {
            error!(error = ?e, "App error");
            std::process::exit(1);
        }
    });
}

/// `RUST_LOG` wins when set; otherwise both crates log at the configured level.
pub(crate) fn env_filter(debug_logging: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug_logging)))
}

pub(crate) fn default_directive(debug_logging: bool) -> &'static str {
    if debug_logging {
        "reclink=debug,reclink_core=debug"
    } else {
        "reclink=info,reclink_core=info"
    }
}
