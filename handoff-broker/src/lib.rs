//! # handoff-broker
//!
//! Brokered affine value exchange.
//!
//! A single broker task mediates a keyed registry of single-value slots
//! shared by independent execution contexts. One context
//! [`give`](AffineHandle::give)s a value; exactly one
//! [`take`](AffineHandle::take) — from any context — receives it, FIFO-fair
//! among waiters, with the value moved (never cloned) to its taker. Before
//! committing a value to a queued taker, the broker verifies the taker is
//! still reachable with a liveness handshake, so an abandoned take cannot
//! pin a queue forever.
//!
//! ```rust,ignore
//! let broker = Broker::spawn(ExchangeConfig::default());
//! let session = broker.handle::<SessionToken>("session");
//!
//! session.give(token).await?;        // one context parks the token
//! let token = session.take().await?; // exactly one other claims it
//! ```
//!
//! For tasks confined to a single execution context,
//! [`LocalAffine`](handoff_core::LocalAffine) offers the same contract
//! without a broker or liveness verification.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export core types for convenience
pub use handoff_core::{
    CodecError, FifoQueue, JsonCodec, LocalAffine, MessageCodec, TimeError, TimeProvider,
    TokioTimeProvider,
};

// =============================================================================
// Modules
// =============================================================================

/// Broker front-end and handles.
pub mod broker;

/// Per-request reply channels.
pub mod channel;

/// Exchange configuration.
pub mod config;

/// The exchange engine and delivery loop.
pub mod engine;

/// Caller-facing errors.
pub mod error;

/// The waiter seam between engine and transport.
pub mod waiter;

/// Wire-level request and reply types.
pub mod wire;

mod client;
mod slot;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use broker::{Broker, BrokerHandle};
pub use channel::{reply_channel, ReplyReceiver, ReplySender};
pub use client::AffineHandle;
pub use config::ExchangeConfig;
pub use engine::{ExchangeEngine, GiveOutcome, SlotOccupied};
pub use error::ClientError;
pub use waiter::Waiter;
pub use wire::{Action, RejectReason, Reply, ReplyData, Request};
