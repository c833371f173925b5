//! Classifies inbound frames into domain notifications.
//!
//! Only MESSAGE frames on a bits topic produce a notification; everything
//! else is dropped. A malformed payload is logged and dropped, never
//! propagated — a single bad frame must not end the subscription.

use tracing::{debug, trace, warn};

use crate::pubsub::protocol::{
    BITS_TOPIC_MARKER, BitsEventEnvelope, BitsNotification, InboundFrame,
};

pub(crate) fn route(frame: &InboundFrame) -> Option<BitsNotification> {
    match frame {
        InboundFrame::Message { data } => {
            if !data.topic.contains(BITS_TOPIC_MARKER) {
                debug!("Dropping message on unrecognized topic: {}", data.topic);
                return None;
            }
            match serde_json::from_str::<BitsEventEnvelope>(&data.message) {
                Ok(envelope) => Some(envelope.data),
                Err(err) => {
                    warn!("Dropping undecodable bits payload: {err}");
                    None
                }
            }
        }
        InboundFrame::Response { nonce, error } => {
            match error {
                Some(err) if !err.is_empty() => {
                    warn!("LISTEN request {nonce:?} was rejected: {err}");
                }
                _ => debug!("LISTEN request {nonce:?} acknowledged"),
            }
            None
        }
        InboundFrame::Pong => {
            trace!("Received PONG");
            None
        }
        InboundFrame::Reconnect => {
            debug!("Edge requested reconnect; the session will drop shortly");
            None
        }
        InboundFrame::Other => {
            debug!("Ignoring unrecognized frame");
            None
        }
    }
}
