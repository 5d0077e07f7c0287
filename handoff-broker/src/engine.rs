//! Exchange engine: take/give and liveness-verified delivery.
//!
//! All slot state lives behind one mutex that is only ever held for the span
//! of a decision — never across a suspension point. Dispatching is otherwise
//! serialized by the broker, so the single source of true interleaving is a
//! give's delivery task: it probes a candidate waiter *outside* the lock
//! (probing suspends), and by the time the probe resolves a concurrent
//! operation may have reshaped the slot. Every iteration therefore
//! re-acquires the lock and re-checks the queue before acting; a decision is
//! committed in the same critical section that validated it.
//!
//! # Delivery
//!
//! A give with takers queued dequeues the oldest waiter up front, inside the
//! serialized dispatch — that pairing is what keeps concurrent gives FIFO —
//! and then runs a liveness handshake before committing the value: the
//! waiter must acknowledge a probe within [`ExchangeConfig::probe_timeout`].
//! A verified-live waiter receives the value directly — it never touches the
//! slot, preserving FIFO fairness. An unresponsive waiter is discarded, not
//! re-queued, and the loop moves to the next. This is a heuristic: a slow
//! waiter can be discarded alive, and a waiter can die right after
//! acknowledging, in which case the value is lost to it. That trade is
//! accepted in exchange for abandoned takers never blocking a queue forever.

use std::sync::Arc;

use handoff_core::{TimeError, TimeProvider, TokioTimeProvider};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ExchangeConfig;
use crate::slot::SlotRegistry;
use crate::waiter::Waiter;

/// First-decision outcome of a give.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveOutcome {
    /// No taker was queued; the value is parked in the slot.
    Stored,
    /// The oldest taker was dequeued; liveness-verified delivery continues
    /// on a background task.
    Delivering,
}

/// A give was refused: the slot already holds an undelivered value and no
/// takers are queued.
#[derive(Debug, Error)]
#[error("slot already holds an undelivered value")]
pub struct SlotOccupied(
    /// The refused payload, handed back untouched.
    pub Vec<u8>,
);

/// The keyed exchange state machine.
///
/// Generic over the [`Waiter`] transport seam and the [`TimeProvider`]
/// backing probe deadlines. Cloning is cheap and shares the registry.
pub struct ExchangeEngine<W, T = TokioTimeProvider> {
    registry: Arc<Mutex<SlotRegistry<W>>>,
    time: T,
    config: ExchangeConfig,
}

impl<W, T> Clone for ExchangeEngine<W, T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            time: self.time.clone(),
            config: self.config.clone(),
        }
    }
}

impl<W, T> ExchangeEngine<W, T>
where
    W: Waiter,
    T: TimeProvider,
{
    /// Create an engine with an empty registry.
    pub fn new(config: ExchangeConfig, time: T) -> Self {
        Self {
            registry: Arc::new(Mutex::new(SlotRegistry::new())),
            time,
            config,
        }
    }

    /// Consume the slot's value or queue the waiter for a future give.
    ///
    /// When a value is parked, it is moved out and delivered through the
    /// waiter synchronously; otherwise the waiter joins the tail of the wait
    /// queue and this call returns with delivery pending.
    pub fn take(&self, key: &str, waiter: W) {
        let payload = {
            let mut registry = self.registry.lock();
            let slot = registry.slot_mut(key);
            match slot.take_ready() {
                Some(payload) => payload,
                None => {
                    slot.push_waiter(waiter);
                    debug!(key, "take queued");
                    return;
                }
            }
        };
        debug!(key, "take resolved from parked value");
        waiter.deliver(payload);
    }

    /// Provide a value.
    ///
    /// Resolves as soon as the first decision is made: either the value is
    /// parked ([`GiveOutcome::Stored`]) or the oldest queued taker has been
    /// claimed for it ([`GiveOutcome::Delivering`]) — liveness verification
    /// and the actual handoff continue on a background task after this call
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`SlotOccupied`] — with the payload handed back — when the
    /// slot already holds an undelivered value and no takers are queued.
    pub fn give(&self, key: &str, payload: Vec<u8>) -> Result<GiveOutcome, SlotOccupied> {
        let claimed = {
            let mut registry = self.registry.lock();
            let slot = registry.slot_mut(key);
            match slot.pop_waiter() {
                Some(waiter) => waiter,
                None => {
                    return match slot.store_ready(payload) {
                        Ok(()) => {
                            debug!(key, "give parked value");
                            Ok(GiveOutcome::Stored)
                        }
                        Err(payload) => Err(SlotOccupied(payload)),
                    };
                }
            }
        };

        let engine = self.clone();
        let key = key.to_owned();
        tokio::spawn(async move { engine.deliver(key, claimed, payload).await });
        Ok(GiveOutcome::Delivering)
    }

    /// `true` iff a take on `key` would resolve synchronously right now.
    pub fn is_ready(&self, key: &str) -> bool {
        self.registry
            .lock()
            .get(key)
            .is_some_and(|slot| slot.is_ready())
    }

    /// Number of takers queued on `key`; 0 for a key never referenced.
    pub fn wait_count(&self, key: &str) -> usize {
        self.registry
            .lock()
            .get(key)
            .map_or(0, |slot| slot.wait_count())
    }

    /// Probe-and-retry delivery loop.
    ///
    /// `claimed` was dequeued by the serialized give dispatch; every further
    /// candidate is dequeued under the lock, then probed with the lock
    /// released. Once the queue re-checks empty the value is parked — unless
    /// a concurrent give parked one first, in which case this value has
    /// nowhere left to go (its giver was already acknowledged) and is
    /// dropped loudly.
    async fn deliver(self, key: String, claimed: W, payload: Vec<u8>) {
        let mut next = Some(claimed);
        loop {
            let waiter = match next.take() {
                Some(waiter) => waiter,
                None => {
                    let mut registry = self.registry.lock();
                    let slot = registry.slot_mut(&key);
                    match slot.pop_waiter() {
                        Some(waiter) => waiter,
                        None => {
                            match slot.store_ready(payload) {
                                Ok(()) => {
                                    debug!(key = %key, "give parked value after draining dead takers");
                                }
                                Err(dropped) => error!(
                                    key = %key,
                                    bytes = dropped.len(),
                                    "value dropped: slot was filled while probing dead takers"
                                ),
                            }
                            return;
                        }
                    }
                }
            };

            match self.verify_live(waiter).await {
                Some(waiter) => {
                    // Verified live: the value goes straight to the waiter,
                    // bypassing the slot.
                    debug!(key = %key, "give delivered to queued taker");
                    waiter.deliver(payload);
                    return;
                }
                None => warn!(key = %key, "discarded unresponsive taker"),
            }
        }
    }

    /// Liveness handshake rounds for one candidate waiter.
    ///
    /// Returns the waiter back when it acknowledged within the deadline, or
    /// `None` once it is presumed dead.
    async fn verify_live(&self, mut waiter: W) -> Option<W> {
        for _ in 0..self.config.probe_attempts.max(1) {
            let round = self
                .time
                .timeout(self.config.probe_timeout, waiter.probe())
                .await;
            match round {
                Ok(true) => return Some(waiter),
                // Channel closed: definitely gone, no point retrying.
                Ok(false) => return None,
                Err(TimeError::Elapsed) => {}
            }
        }
        None
    }
}
