//! Caller-facing exchange handle.
//!
//! An [`AffineHandle`] binds a slot key, a value type, and a codec. Every
//! operation allocates a fresh reply channel, sends exactly one request, and
//! consumes exactly one terminal reply; while a take is suspended the handle
//! transparently acknowledges the broker's liveness probes, keeping the call
//! eligible for delivery.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use handoff_core::{JsonCodec, MessageCodec};

use crate::broker::BrokerHandle;
use crate::channel::reply_channel;
use crate::error::ClientError;
use crate::wire::{Action, ReplyData, Request};

/// Typed handle on one exchange slot.
///
/// Cheap to clone; clones address the same slot. The value type only needs
/// serde bounds — it is encoded on give and decoded on take, and the broker
/// moves the bytes without interpreting them.
pub struct AffineHandle<V, C = JsonCodec> {
    broker: BrokerHandle,
    key: String,
    codec: C,
    _value: PhantomData<fn() -> V>,
}

impl<V, C> AffineHandle<V, C> {
    pub(crate) fn new(broker: BrokerHandle, key: String, codec: C) -> Self {
        Self {
            broker,
            key,
            codec,
            _value: PhantomData,
        }
    }

    /// The slot key this handle addresses.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<V, C> AffineHandle<V, C>
where
    V: Serialize + DeserializeOwned,
    C: MessageCodec,
{
    /// Take the value, suspending until one is given.
    ///
    /// Resolves immediately when the slot is ready; otherwise the call
    /// queues behind earlier takers (FIFO) with no timeout of its own.
    /// Callers wanting a bounded wait should wrap the call, bearing in mind
    /// that delivery can race such a timeout: a value may arrive for a
    /// caller that already gave up.
    ///
    /// # Errors
    ///
    /// [`ClientError::BrokerUnavailable`] / [`ClientError::BrokerClosed`]
    /// when the broker is gone before/after the request was sent;
    /// [`ClientError::Codec`] when the payload does not decode as `V`;
    /// [`ClientError::UnexpectedReply`] when the broker answers with
    /// something other than a value.
    pub async fn take(&self) -> Result<V, ClientError> {
        match self.call(Action::Take, None).await? {
            ReplyData::Value(payload) => Ok(self.codec.decode(&payload)?),
            other => Err(ClientError::unexpected("value", &other)),
        }
    }

    /// Give a value to the slot.
    ///
    /// Resolves once the broker accepts the value — parked, or on its way
    /// to a verified-live taker. Acceptance is not receipt: delivery may
    /// still be in flight when this returns.
    ///
    /// # Errors
    ///
    /// [`ClientError::Rejected`] when the slot already holds an undelivered
    /// value; transport and codec errors as for [`take`](Self::take).
    pub async fn give(&self, value: V) -> Result<(), ClientError> {
        let payload = self.codec.encode(&value)?;
        match self.call(Action::Give, Some(payload)).await? {
            ReplyData::Ack => Ok(()),
            other => Err(ClientError::unexpected("ack", &other)),
        }
    }

    /// `true` iff an immediately following [`take`](Self::take) would
    /// resolve synchronously (assuming no interleaved callers).
    ///
    /// # Errors
    ///
    /// Transport errors as for [`take`](Self::take).
    pub async fn is_ready(&self) -> Result<bool, ClientError> {
        match self.call(Action::IsReady, None).await? {
            ReplyData::Ready(ready) => Ok(ready),
            other => Err(ClientError::unexpected("ready", &other)),
        }
    }

    /// Number of takers currently queued on this slot.
    ///
    /// # Errors
    ///
    /// Transport errors as for [`take`](Self::take).
    pub async fn wait_count(&self) -> Result<usize, ClientError> {
        match self.call(Action::WaitCount, None).await? {
            ReplyData::Count(count) => Ok(count),
            other => Err(ClientError::unexpected("count", &other)),
        }
    }

    /// One request, one terminal reply.
    async fn call(&self, action: Action, value: Option<Vec<u8>>) -> Result<ReplyData, ClientError> {
        if !self.broker.is_running() {
            return Err(ClientError::BrokerUnavailable);
        }

        let (reply_tx, mut reply_rx) = reply_channel();
        self.broker.request(Request {
            action,
            key: self.key.clone(),
            value,
            reply: reply_tx,
        })?;

        match reply_rx.recv_final().await {
            Some(Ok(data)) => Ok(data),
            Some(Err(reason)) => Err(ClientError::Rejected(reason)),
            None => Err(ClientError::BrokerClosed),
        }
    }
}

impl<V, C: Clone> Clone for AffineHandle<V, C> {
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            key: self.key.clone(),
            codec: self.codec.clone(),
            _value: PhantomData,
        }
    }
}
