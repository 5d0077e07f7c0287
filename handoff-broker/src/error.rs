//! Errors surfaced to exchange callers.

use thiserror::Error;

use handoff_core::CodecError;

use crate::wire::{RejectReason, ReplyData};

/// Errors a client call can surface.
///
/// Liveness failures never appear here: an unreachable taker is an internal
/// condition the broker retries past, invisible to every caller.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The broker cannot currently accept requests. Surfaced before the
    /// request is sent; the call can be retried once a broker is running.
    #[error("exchange broker is not running")]
    BrokerUnavailable,

    /// The broker shut down after accepting the request but before sending
    /// a terminal reply (e.g. while this take was queued).
    #[error("exchange broker shut down before replying")]
    BrokerClosed,

    /// The broker rejected the request.
    #[error("request rejected: {0}")]
    Rejected(#[from] RejectReason),

    /// The broker answered with the wrong reply shape — distinct from any
    /// legitimately decoded value, however falsy.
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        /// The reply shape this call required.
        expected: &'static str,
        /// The reply shape that actually arrived.
        got: &'static str,
    },

    /// The value failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ClientError {
    pub(crate) fn unexpected(expected: &'static str, got: &ReplyData) -> Self {
        ClientError::UnexpectedReply {
            expected,
            got: got.kind(),
        }
    }
}
