//! The seam between the exchange engine and the transport.
//!
//! A [`Waiter`] is a queued take: something a value can be committed to. The
//! engine never sees channels or wire types — it dequeues a waiter, asks it
//! to prove there is still a consumer attached, and on success moves the
//! value into it. [`deliver`](Waiter::deliver) consumes the waiter, so a
//! value can be committed through it at most once.

use async_trait::async_trait;

/// A queued take request awaiting a future give.
#[async_trait]
pub trait Waiter: Send + 'static {
    /// Move the encoded value to the waiting context.
    ///
    /// Consumes the waiter: there is no way to deliver twice. The far side
    /// may have vanished between its last liveness acknowledgement and this
    /// call — that window is accepted by the protocol, so implementations
    /// must tolerate delivering into the void.
    fn deliver(self, payload: Vec<u8>);

    /// Ask the far side to prove it is still consuming.
    ///
    /// Resolves `true` once an acknowledgement arrives and `false` when the
    /// channel is known to be closed. May suspend indefinitely waiting for
    /// an acknowledgement; the engine bounds the wait with its probe
    /// deadline.
    async fn probe(&mut self) -> bool;
}
