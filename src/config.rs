//! Configuration types and loading for the service.
//!
//! The config is read once at startup and never re-read; invalid or missing
//! values are the only fatal error class in the program.

use alloc::sync::Arc;
use std::path::Path;

use eyre::{WrapErr as _, ensure};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tokio::fs;

/// Root config structure: web server binding, subscription parameters, and
/// trigger tuning.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct ServiceConfig {
    /// HTTP server binding configuration.
    pub server: ServerConfig,
    /// Subscription to the remote bits event stream.
    pub pubsub: PubSubConfig,
    /// Actuation trigger tuning (defaults apply when omitted).
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// HTTP server binding configuration section.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct ServerConfig {
    /// TCP port for the countdown web service.
    pub port: u16,
    /// Bind address for the HTTP listener.
    pub bind: String,
}

/// Connection parameters for the remote pub/sub endpoint.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct PubSubConfig {
    /// The id of the channel whose bits events we listen to.
    pub channel_id: String,
    /// OAuth credential sent with the LISTEN request. A leading `oauth:`
    /// prefix is stripped before it goes on the wire.
    pub auth_token: Arc<SecretString>,
    /// Websocket URI of the pub/sub edge.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Seconds between keepalive PING frames.
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    /// Seconds to wait before reconnecting after a dropped session.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,
}

/// Actuation trigger tuning.
#[derive(Debug, Deserialize, Clone)]
pub(crate) struct TriggerConfig {
    /// Seconds a successful pulse locks out further single-bit triggers.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u32,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "wss://pubsub-edge.twitch.tv".to_string()
}

const fn default_heartbeat_interval_secs() -> u64 {
    300
}

const fn default_reconnect_backoff_secs() -> u64 {
    10
}

const fn default_cooldown_secs() -> u32 {
    60
}

impl ServiceConfig {
    /// Startup validation for values the service cannot run without.
    fn validate(&self) -> eyre::Result<()> {
        ensure!(
            !self.pubsub.channel_id.trim().is_empty(),
            "pubsub.channel_id must not be empty"
        );
        ensure!(
            !self.pubsub.auth_token.expose_secret().trim().is_empty(),
            "pubsub.auth_token must not be empty"
        );
        ensure!(
            self.pubsub.endpoint.starts_with("ws://") || self.pubsub.endpoint.starts_with("wss://"),
            "pubsub.endpoint must be a ws:// or wss:// URI, got: {}",
            self.pubsub.endpoint
        );
        Ok(())
    }
}

/// Reads, parses and validates the service config from a TOML file.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if a
/// required value is missing or invalid.
pub(crate) async fn load<P: AsRef<Path>>(path: P) -> eyre::Result<ServiceConfig> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(&path).await.wrap_err(format!(
        "Failed to read config file at: {}",
        path_ref.display()
    ))?;
    let config: ServiceConfig = toml::from_str(&content).wrap_err(format!(
        "Failed to parse config as TOML at: {}",
        path_ref.display()
    ))?;
    config
        .validate()
        .wrap_err(format!("Invalid config at: {}", path_ref.display()))?;
    Ok(config)
}
