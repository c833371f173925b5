//! Thin, fail-fast websocket transport for the pub/sub session.
//!
//! No retry logic lives here; every failure is reported to the subscription
//! loop, which owns reconnection. The write half is shared behind a mutex so
//! the heartbeat task can send through the same session as the subscribe
//! handshake.

use alloc::sync::Arc;
use core::future::Future;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use thiserror::Error as ThisError;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};
use tracing::{debug, warn};

use crate::pubsub::protocol::{ClientFrame, InboundFrame};

/// Session-level transport failures. All of these end the current session and
/// are recovered by the subscription loop.
#[derive(Debug, ThisError)]
pub(crate) enum TransportError {
    #[error("failed to open connection: {0}")]
    Connect(tungstenite::Error),
    #[error("failed to send frame: {0}")]
    Send(tungstenite::Error),
    #[error("failed to receive frame: {0}")]
    Receive(tungstenite::Error),
    #[error("connection closed by remote")]
    Closed,
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Something that can open one session to the pub/sub endpoint.
///
/// The seam exists so the subscription loop's retry policy can be exercised
/// against a scripted fake without sockets.
pub(crate) trait Transport: Send + Sync + 'static {
    type Tx: FrameTx;
    type Rx: FrameRx;

    fn connect(&self) -> impl Future<Output = Result<(Self::Tx, Self::Rx), TransportError>> + Send;
}

/// Write half of a session; cloned into the heartbeat task.
pub(crate) trait FrameTx: Clone + Send + Sync + 'static {
    fn send(&self, frame: ClientFrame) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Read half of a session.
pub(crate) trait FrameRx: Send {
    fn next_frame(&mut self) -> impl Future<Output = Result<InboundFrame, TransportError>> + Send;
}

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, tungstenite::Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// The real websocket transport.
pub(crate) struct WsTransport {
    endpoint: String,
}

impl WsTransport {
    pub(crate) fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Transport for WsTransport {
    type Tx = WsFrameTx;
    type Rx = WsFrameRx;

    async fn connect(&self) -> Result<(Self::Tx, Self::Rx), TransportError> {
        let (stream, _) = connect_async(self.endpoint.as_str())
            .await
            .map_err(TransportError::Connect)?;
        debug!("Connected to {}", self.endpoint);
        let (sink, source) = stream.split();
        Ok((
            WsFrameTx(Arc::new(Mutex::new(sink))),
            WsFrameRx(source),
        ))
    }
}

/// Shared write half of one websocket session.
#[derive(Clone)]
pub(crate) struct WsFrameTx(Arc<Mutex<WsSink>>);

impl FrameTx for WsFrameTx {
    async fn send(&self, frame: ClientFrame) -> Result<(), TransportError> {
        let text = serde_json::to_string(&frame)?;
        self.0
            .lock()
            .await
            .send(tungstenite::Message::Text(text.into()))
            .await
            .map_err(TransportError::Send)
    }
}

/// Read half of one websocket session.
pub(crate) struct WsFrameRx(WsSource);

impl FrameRx for WsFrameRx {
    async fn next_frame(&mut self) -> Result<InboundFrame, TransportError> {
        loop {
            match self.0.next().await {
                None => return Err(TransportError::Closed),
                Some(Err(err)) => return Err(TransportError::Receive(err)),
                Some(Ok(tungstenite::Message::Text(text))) => {
                    match serde_json::from_str(&text) {
                        Ok(frame) => return Ok(frame),
                        // A single bad frame never ends the session.
                        Err(err) => warn!("Dropping undecodable frame: {err}"),
                    }
                }
                Some(Ok(tungstenite::Message::Close(_))) => return Err(TransportError::Closed),
                Some(Ok(_)) => debug!("Ignoring non-text websocket frame"),
            }
        }
    }
}
