//! Broker front-end: request dispatch.
//!
//! The broker is a single task owning the [`ExchangeEngine`]. Requests
//! arrive on an unbounded channel and are dispatched one at a time; every
//! dispatch runs to completion without suspending (a give's
//! liveness-verified delivery continues on its own task), so request
//! handling itself is strictly serialized. The broker stops once every
//! [`BrokerHandle`] is gone; tearing down the registry drops all queued
//! waiters, which fails their pending takes.

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use handoff_core::{JsonCodec, MessageCodec, TimeProvider, TokioTimeProvider};

use crate::channel::ReplySender;
use crate::client::AffineHandle;
use crate::config::ExchangeConfig;
use crate::engine::{ExchangeEngine, SlotOccupied};
use crate::error::ClientError;
use crate::wire::{Action, RejectReason, ReplyData, Request};

/// The broker task: engine plus the request stream feeding it.
pub struct Broker<T = TokioTimeProvider> {
    engine: ExchangeEngine<ReplySender, T>,
    requests: mpsc::UnboundedReceiver<Request>,
}

impl Broker<TokioTimeProvider> {
    /// Start a broker on the ambient tokio runtime and return the handle
    /// clients reach it through.
    pub fn spawn(config: ExchangeConfig) -> BrokerHandle {
        Self::spawn_with_time(config, TokioTimeProvider::new())
    }
}

impl<T> Broker<T>
where
    T: TimeProvider,
{
    /// Start a broker with a custom [`TimeProvider`] backing its probe
    /// deadlines.
    pub fn spawn_with_time(config: ExchangeConfig, time: T) -> BrokerHandle {
        let (requests_tx, requests_rx) = mpsc::unbounded_channel();
        let broker = Broker {
            engine: ExchangeEngine::new(config, time),
            requests: requests_rx,
        };
        tokio::spawn(broker.run());
        BrokerHandle {
            requests: requests_tx,
        }
    }

    async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.dispatch(request);
        }
        debug!("all broker handles dropped; exchange broker stopping");
    }

    fn dispatch(&self, request: Request) {
        let Request {
            action,
            key,
            value,
            reply,
        } = request;
        trace!(?action, key = %key, "dispatching exchange request");

        match action {
            Action::Take => self.engine.take(&key, reply),
            Action::Give => match value {
                Some(payload) => match self.engine.give(&key, payload) {
                    Ok(_) => reply.data(ReplyData::Ack),
                    Err(SlotOccupied(_)) => {
                        warn!(key = %key, "give rejected: slot occupied");
                        reply.reject(RejectReason::SlotOccupied);
                    }
                },
                None => {
                    warn!(key = %key, "malformed give: no value attached");
                    reply.reject(RejectReason::MissingValue);
                }
            },
            Action::IsReady => reply.data(ReplyData::Ready(self.engine.is_ready(&key))),
            Action::WaitCount => reply.data(ReplyData::Count(self.engine.wait_count(&key))),
        }
    }
}

/// Clonable handle reaching a running broker.
///
/// Dropping every handle shuts the broker down.
#[derive(Clone, Debug)]
pub struct BrokerHandle {
    requests: mpsc::UnboundedSender<Request>,
}

impl BrokerHandle {
    /// A typed handle on `key`, using the default [`JsonCodec`].
    pub fn handle<V>(&self, key: impl Into<String>) -> AffineHandle<V, JsonCodec> {
        self.handle_with_codec(key, JsonCodec)
    }

    /// A typed handle on `key` with a caller-chosen codec.
    pub fn handle_with_codec<V, C: MessageCodec>(
        &self,
        key: impl Into<String>,
        codec: C,
    ) -> AffineHandle<V, C> {
        AffineHandle::new(self.clone(), key.into(), codec)
    }

    /// `false` once the broker task has stopped (or was torn down with its
    /// runtime); requests sent past that point fail fast instead of hanging.
    pub fn is_running(&self) -> bool {
        !self.requests.is_closed()
    }

    /// Enqueue a raw wire-level request.
    ///
    /// This is the escape hatch the typed [`AffineHandle`] is built on; use
    /// it to integrate custom reply-channel handling.
    ///
    /// # Errors
    ///
    /// [`ClientError::BrokerUnavailable`] when the broker is gone.
    pub fn request(&self, request: Request) -> Result<(), ClientError> {
        self.requests
            .send(request)
            .map_err(|_| ClientError::BrokerUnavailable)
    }
}
