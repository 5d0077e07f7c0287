//! Request and reply types exchanged with the broker.
//!
//! One client call becomes one [`Request`] carrying an [`Action`], the slot
//! key it targets, an optional encoded value, and the reply half of a fresh
//! [`reply channel`](crate::channel::reply_channel). The broker answers every
//! request with exactly one terminal [`Reply`]: either [`Reply::Data`] or
//! [`Reply::Error`]. A queued taker may additionally observe any number of
//! [`Reply::LivenessProbe`] messages before its terminal reply; each must be
//! acknowledged on the channel's ack half for the taker to stay eligible for
//! delivery.

use serde::{Deserialize, Serialize};

use crate::channel::ReplySender;

/// Operations understood by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Consume the slot's value, waiting for a future give if necessary.
    Take,
    /// Provide a value; requires [`Request::value`].
    Give,
    /// Would a take on this key resolve synchronously right now?
    IsReady,
    /// How many takers are queued on this key?
    WaitCount,
}

/// One client call.
#[derive(Debug)]
pub struct Request {
    /// The operation to perform.
    pub action: Action,
    /// Key selecting the slot; slots are created lazily on first use.
    pub key: String,
    /// Encoded value payload; required by [`Action::Give`], ignored
    /// otherwise.
    pub value: Option<Vec<u8>>,
    /// Where the broker sends this call's replies.
    pub reply: ReplySender,
}

/// Broker → client message.
#[derive(Debug)]
pub enum Reply {
    /// Terminal reply: the call succeeded with this outcome.
    Data(ReplyData),
    /// The broker is verifying this channel still has a live consumer before
    /// committing a value to it. Acknowledge on the ack half; an
    /// unacknowledged probe gets the waiter discarded after the broker's
    /// probe deadline.
    LivenessProbe,
    /// Terminal reply: the call was rejected.
    Error(RejectReason),
}

/// Successful call outcome, one variant per [`Action`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyData {
    /// A taken value, still encoded.
    Value(Vec<u8>),
    /// A give was accepted. Delivery may still be in flight: acceptance
    /// means the broker has either parked the value or begun handing it to a
    /// verified-live taker.
    Ack,
    /// Answer to [`Action::IsReady`].
    Ready(bool),
    /// Answer to [`Action::WaitCount`].
    Count(usize),
}

impl ReplyData {
    /// Short label for the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyData::Value(_) => "value",
            ReplyData::Ack => "ack",
            ReplyData::Ready(_) => "ready",
            ReplyData::Count(_) => "count",
        }
    }
}

/// Why the broker rejected a request.
///
/// Serializable so rejections can cross context boundaries verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RejectReason {
    /// A give arrived with no value attached.
    #[error("give carried no value")]
    MissingValue,
    /// A give targeted a slot that already holds an undelivered value and
    /// has no takers queued; the slot holds at most one value at a time.
    #[error("slot already holds an undelivered value")]
    SlotOccupied,
}
