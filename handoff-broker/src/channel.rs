//! Per-request reply channels.
//!
//! Every client call owns a dedicated, single-use reply channel. It is
//! bidirectional: replies flow broker → client on the reply stream, and
//! liveness acknowledgements flow client → broker on the ack stream. The
//! broker half ([`ReplySender`]) doubles as the [`Waiter`] stored in a
//! slot's wait queue while a take is pending.

use tokio::sync::mpsc;

use async_trait::async_trait;

use crate::waiter::Waiter;
use crate::wire::{RejectReason, Reply, ReplyData};

/// Create a fresh reply channel pair for one request.
pub fn reply_channel() -> (ReplySender, ReplyReceiver) {
    let (reply_tx, reply_rx) = mpsc::unbounded_channel();
    let (ack_tx, ack_rx) = mpsc::unbounded_channel();
    (
        ReplySender { reply_tx, ack_rx },
        ReplyReceiver { reply_rx, ack_tx },
    )
}

/// Broker-held half of a reply channel.
///
/// The terminal-reply methods consume the sender, so each request receives
/// at most one terminal reply.
#[derive(Debug)]
pub struct ReplySender {
    reply_tx: mpsc::UnboundedSender<Reply>,
    ack_rx: mpsc::UnboundedReceiver<()>,
}

impl ReplySender {
    /// Send the terminal success reply. A closed far side is ignored — a
    /// caller that stopped listening forfeits its reply.
    pub fn data(self, data: ReplyData) {
        let _ = self.reply_tx.send(Reply::Data(data));
    }

    /// Send the terminal rejection reply.
    pub fn reject(self, reason: RejectReason) {
        let _ = self.reply_tx.send(Reply::Error(reason));
    }
}

#[async_trait]
impl Waiter for ReplySender {
    fn deliver(self, payload: Vec<u8>) {
        let _ = self.reply_tx.send(Reply::Data(ReplyData::Value(payload)));
    }

    async fn probe(&mut self) -> bool {
        if self.reply_tx.send(Reply::LivenessProbe).is_err() {
            // Receiver gone: no deadline needed, the consumer is dead.
            return false;
        }
        self.ack_rx.recv().await.is_some()
    }
}

/// Client-held half of a reply channel.
#[derive(Debug)]
pub struct ReplyReceiver {
    reply_rx: mpsc::UnboundedReceiver<Reply>,
    ack_tx: mpsc::UnboundedSender<()>,
}

impl ReplyReceiver {
    /// Receive the next raw reply, probes included. `None` once the broker
    /// has dropped its half.
    pub async fn recv(&mut self) -> Option<Reply> {
        self.reply_rx.recv().await
    }

    /// Acknowledge a liveness probe.
    pub fn ack(&self) {
        let _ = self.ack_tx.send(());
    }

    /// Receive the terminal reply, transparently acknowledging any liveness
    /// probes that arrive first. `None` once the broker has dropped its half
    /// without replying.
    pub async fn recv_final(&mut self) -> Option<Result<ReplyData, RejectReason>> {
        loop {
            match self.recv().await? {
                Reply::LivenessProbe => self.ack(),
                Reply::Data(data) => return Some(Ok(data)),
                Reply::Error(reason) => return Some(Err(reason)),
            }
        }
    }
}
