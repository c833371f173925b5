//! Session keepalive: a periodic PING task bound to one session.

use core::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::pubsub::protocol::ClientFrame;
use crate::pubsub::transport::FrameTx;

/// Spawn the keepalive task for one session. The first PING goes out
/// immediately, then one per interval. The task ends silently when a send
/// fails, since the subscription loop is already tearing the session down at
/// that point. The caller must abort the handle when the session ends so no
/// heartbeat outlives its session.
pub(crate) fn spawn<T: FrameTx>(tx: T, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.send(ClientFrame::Ping).await.is_err() {
                debug!("Heartbeat send failed, ending keepalive");
                break;
            }
            trace!("Sent keepalive PING");
        }
    })
}
