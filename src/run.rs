//! Service wiring and startup.

use alloc::string;
use alloc::sync::Arc;
use core::net::{IpAddr, SocketAddr};
use std::path::Path;

use tokio::sync::{broadcast, watch};
use tokio::{net, signal};
use tracing::info;

use crate::config;
use crate::hardware::{Actuator, AudioPlayer, LoggingActuator, LoggingAudio};
use crate::http;
use crate::pubsub::{Listener, transport::WsTransport};
use crate::state::{AppState, CooldownState};
use crate::trigger::TriggerController;

/// Creates a future that resolves when a shutdown signal is received.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to create SIGTERM signal handler");
        let _ = sigterm.recv().await;
    }
    #[cfg(not(unix))]
    {
        drop(signal::ctrl_c().await);
    }
}

/// Start the countdown web service.
async fn start_server(app_state: AppState, listen_ip: IpAddr, listen_port: u16) -> eyre::Result<()> {
    let app = http::create_app(app_state);
    let addr = SocketAddr::from((listen_ip, listen_port));

    info!("Listening on http://{}", addr);
    let listener = net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);
    tokio::select! {
        res = server => res?,
        () = shutdown_signal() => {
            info!("Received shutdown, shutting down");
        }
    }

    Ok(())
}

/// Load the config, wire the trigger pipeline, spawn the subscription and
/// serve the countdown page until shutdown.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the HTTP server
/// cannot bind.
pub(crate) async fn start(
    config_path: &Path,
    port_override: Option<u16>,
    bind_override: Option<&str>,
) -> eyre::Result<()> {
    let config = config::load(config_path).await?;

    // Apply optional overrides from CLI/tests
    let listen_port = port_override.unwrap_or(config.server.port);
    let bind_str = bind_override.map_or_else(
        || config.server.bind.clone(),
        string::ToString::to_string,
    );
    let listen_ip: IpAddr = bind_str.parse()?;

    let (state_tx, cooldown_rx) = watch::channel(CooldownState::default());
    let (ws_tx, _) = broadcast::channel(32);

    let actuator: Arc<dyn Actuator> = Arc::new(LoggingActuator);
    let audio: Arc<dyn AudioPlayer> = Arc::new(LoggingAudio);
    let trigger = Arc::new(TriggerController::new(
        state_tx,
        ws_tx.clone(),
        actuator,
        audio,
        config.trigger.cooldown_secs,
    ));

    let transport = WsTransport::new(config.pubsub.endpoint.clone());
    let listener = Listener::new(transport, &config.pubsub, trigger);
    tokio::spawn(listener.run());

    start_server(AppState { cooldown_rx, ws_tx }, listen_ip, listen_port).await
}
