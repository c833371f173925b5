//! The persistent subscription to the remote bits event stream.
//!
//! [`Listener`] drives the reconnect loop: open a session, subscribe, keep it
//! alive, and pump inbound frames into the router until the session fails.
//! Any failure is answered with a fixed backoff and a fresh session;
//! connectivity loss is never fatal to the process.

pub(crate) mod heartbeat;
pub(crate) mod protocol;
pub(crate) mod transport;

use alloc::sync::Arc;
use core::time::Duration;

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::config::PubSubConfig;
use crate::router;
use crate::trigger::TriggerController;

use protocol::{ClientFrame, bits_topic, fresh_nonce};
use transport::{FrameRx as _, FrameTx as _, Transport, TransportError};

/// One subscription, retried forever.
///
/// The session lifecycle is Disconnected → Connecting → Subscribed and back
/// to Disconnected on any failure: [`Listener::run`] owns the Disconnected
/// edge (backoff and retry), [`Listener::run_session`] the rest.
pub(crate) struct Listener<T> {
    transport: T,
    topic: String,
    auth_token: Arc<SecretString>,
    heartbeat_interval: Duration,
    reconnect_backoff: Duration,
    trigger: Arc<TriggerController>,
}

impl<T: Transport> Listener<T> {
    pub(crate) fn new(
        transport: T,
        pubsub: &PubSubConfig,
        trigger: Arc<TriggerController>,
    ) -> Self {
        Self {
            transport,
            topic: bits_topic(&pubsub.channel_id),
            auth_token: Arc::clone(&pubsub.auth_token),
            heartbeat_interval: Duration::from_secs(pubsub.heartbeat_interval_secs),
            reconnect_backoff: Duration::from_secs(pubsub.reconnect_backoff_secs),
            trigger,
        }
    }

    /// Run the subscription until the process ends. The first attempt
    /// connects immediately; every later one waits out the backoff first.
    pub(crate) async fn run(self) {
        let mut first_attempt = true;
        loop {
            if first_attempt {
                first_attempt = false;
            } else {
                tokio::time::sleep(self.reconnect_backoff).await;
            }
            let err = self.run_session().await;
            warn!(
                "Connection lost or error: {err}. Retrying in {} seconds...",
                self.reconnect_backoff.as_secs()
            );
        }
    }

    /// One Connecting → Subscribed pass; returns the error that ended it.
    async fn run_session(&self) -> TransportError {
        let (tx, mut rx) = match self.transport.connect().await {
            Ok(session) => session,
            Err(err) => return err,
        };
        debug!("Connected to pub/sub edge");

        let listen = ClientFrame::listen(self.topic.clone(), fresh_nonce(), &self.auth_token);
        if let Err(err) = tx.send(listen).await {
            return err;
        }
        info!("Listening on topic: {}", self.topic);

        let keepalive = heartbeat::spawn(tx.clone(), self.heartbeat_interval);
        let err = loop {
            match rx.next_frame().await {
                Ok(frame) => {
                    if let Some(event) = router::route(&frame) {
                        self.trigger.handle(&event);
                    }
                }
                Err(err) => break err,
            }
        };
        // The heartbeat must never outlive its session.
        keepalive.abort();
        err
    }
}
