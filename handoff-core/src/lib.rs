//! # handoff-core
//!
//! Core primitives for the handoff affine exchange.
//!
//! An *affine* value is consumed at most once: it can be handed from one
//! owner to exactly one other owner, never duplicated. This crate provides
//! the building blocks the brokered exchange (`handoff-broker`) is assembled
//! from, plus a self-contained single-context variant:
//!
//! - [`FifoQueue`]: amortized-O(1) wait-queue storage with bounded memory
//! - [`MessageCodec`] / [`JsonCodec`]: pluggable value serialization for
//!   values crossing execution-context boundaries
//! - [`TimeProvider`] / [`TokioTimeProvider`]: sleep/timeout abstraction
//!   backing liveness deadlines
//! - [`LocalAffine`]: the degenerate single-context exchange, where waiters
//!   cannot silently vanish and no liveness verification is needed

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod codec;
mod local;
mod queue;
mod time;

// Codec exports
pub use codec::{CodecError, JsonCodec, MessageCodec};

// Queue exports
pub use queue::FifoQueue;

// Time exports
pub use time::{TimeError, TimeProvider, TokioTimeProvider};

// Single-context exchange exports
pub use local::LocalAffine;
