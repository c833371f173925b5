//! Library entry for the `roostlight` crate.
//!
//! Exposes `inner_main` so the shim binary and integration tests can drive the
//! service: a persistent subscription to the channel bits event stream that
//! pulses the coop light on qualifying events, plus the countdown web service.

extern crate alloc;
extern crate core;

pub mod cli;
mod config;
pub mod hardware;
mod http;
mod pubsub;
mod router;
mod run;
mod state;
mod trigger;
mod websocket;

// for use in integration tests
pub use websocket::WsMessage;

use std::env;
use std::fs;
use std::sync::Once;

use eyre::{Result, WrapErr as _};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt::time::ChronoLocal};

use cli::{Cli, Command};

static INIT_TRACING: Once = Once::new();

/// The service's main function; can be called from the shim binary.
///
/// # Errors
///
/// Returns an error if the configuration is missing or invalid, or if the
/// web service fails to start.
pub async fn inner_main(invocation: Cli) -> Result<()> {
    match invocation.command {
        Command::Serve(args) => {
            let config = &args.config;
            let config_path =
                fs::canonicalize(config).wrap_err(format!("Config file not found at: {config}"))?;

            INIT_TRACING.call_once(|| {
                let default_level = if env::var("ROOSTLIGHT_INTEGRATION_TEST").is_ok() {
                    "error"
                } else {
                    "info"
                };

                tracing_subscriber::fmt()
                    .with_env_filter(
                        EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| EnvFilter::new(default_level)),
                    )
                    .with_timer(ChronoLocal::rfc_3339())
                    .init();
            });

            info!("Starting roostlight");

            run::start(&config_path, args.port, args.bind.as_deref()).await
        }
    }
}
