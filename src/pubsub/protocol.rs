//! Wire frames for the pub/sub session.
//!
//! Outbound frames are LISTEN and PING; inbound frames are an internally
//! tagged enum on `type`, of which only MESSAGE carries a domain event. The
//! domain payload arrives as a JSON-encoded string nested inside the MESSAGE
//! envelope, so decoding happens in two steps.

use chrono::{DateTime, Utc};
use rand::{RngExt as _, distr::Alphanumeric};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

/// Marker that distinguishes the bits event stream among subscribed topics.
pub(crate) const BITS_TOPIC_MARKER: &str = "bits";

/// Topic naming scheme of the remote bits event stream.
pub(crate) fn bits_topic(channel_id: &str) -> String {
    format!("channel-bits-events-v2.{channel_id}")
}

/// Generate a random alphanumeric nonce for the subscribe handshake.
pub(crate) fn fresh_nonce() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(30)
        .map(char::from)
        .collect()
}

/// Frames we send to the remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub(crate) enum ClientFrame {
    /// Subscribe to a set of topics; sent once per established connection.
    #[serde(rename = "LISTEN")]
    Listen { nonce: String, data: ListenData },
    /// Keepalive; fire-and-forget, carries no correlation id.
    #[serde(rename = "PING")]
    Ping,
}

/// Topics and credential of a LISTEN request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ListenData {
    pub topics: Vec<String>,
    pub auth_token: String,
}

impl ClientFrame {
    /// Build a LISTEN request for one topic. A leading `oauth:` prefix on the
    /// credential is stripped before it goes on the wire.
    pub(crate) fn listen(topic: String, nonce: String, auth_token: &SecretString) -> Self {
        let token = auth_token.expose_secret();
        Self::Listen {
            nonce,
            data: ListenData {
                topics: vec![topic],
                auth_token: token.strip_prefix("oauth:").unwrap_or(token).to_string(),
            },
        }
    }
}

/// Frames the remote endpoint sends us.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum InboundFrame {
    /// Envelope around one domain event on one topic.
    #[serde(rename = "MESSAGE")]
    Message { data: TopicMessage },
    /// Ack for a LISTEN request; `error` is empty on success.
    #[serde(rename = "RESPONSE")]
    Response {
        #[serde(default)]
        nonce: Option<String>,
        #[serde(default)]
        error: Option<String>,
    },
    /// Answer to our keepalive; not correlated with any PING.
    #[serde(rename = "PONG")]
    Pong,
    /// The remote edge asks clients to reconnect soon.
    #[serde(rename = "RECONNECT")]
    Reconnect,
    /// Any frame type we don't know.
    #[serde(other)]
    Other,
}

/// Topic and JSON-encoded payload of a MESSAGE frame.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct TopicMessage {
    pub topic: String,
    pub message: String,
}

/// Envelope of the decoded bits payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct BitsEventEnvelope {
    pub data: BitsNotification,
}

/// One bits contribution on the subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct BitsNotification {
    pub user_name: String,
    pub bits_used: u64,
    pub time: DateTime<Utc>,
}
