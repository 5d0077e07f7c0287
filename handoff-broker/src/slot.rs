//! Keyed slot registry.
//!
//! Each key owns a [`Slot`]: at most one parked (undelivered) value, or a
//! FIFO queue of waiters — never both at once. The mutators here enforce
//! that exclusion: breaking it would let a ready value starve queued takers,
//! so a violation is a bug in the engine and panics rather than continuing
//! with corrupted state.
//!
//! The registry is a plain map owned by the engine. Slots are created lazily
//! on first reference and persist for the broker's lifetime; a drained slot
//! is logically empty but its entry stays allocated.

use std::collections::HashMap;

use handoff_core::FifoQueue;

/// Per-key exchange state.
#[derive(Debug)]
pub(crate) struct Slot<W> {
    /// A parked value; `Some` only while `waiters` is empty.
    value: Option<Vec<u8>>,
    waiters: FifoQueue<W>,
}

impl<W> Slot<W> {
    fn new() -> Self {
        Self {
            value: None,
            waiters: FifoQueue::new(),
        }
    }

    /// Move the parked value out, if any.
    pub(crate) fn take_ready(&mut self) -> Option<Vec<u8>> {
        self.value.take()
    }

    /// Park a value. Returns the payload back when one is already parked so
    /// the caller can reject or report it — nothing is overwritten.
    ///
    /// # Panics
    ///
    /// Panics when waiters are queued: parking a value while takers wait
    /// would strand them behind it.
    pub(crate) fn store_ready(&mut self, payload: Vec<u8>) -> Result<(), Vec<u8>> {
        assert!(
            self.waiters.is_empty(),
            "value parked while takers are queued"
        );
        match self.value {
            Some(_) => Err(payload),
            None => {
                self.value = Some(payload);
                Ok(())
            }
        }
    }

    /// Queue a waiter behind any already queued.
    ///
    /// # Panics
    ///
    /// Panics when a value is parked: the waiter should have consumed it
    /// instead of queuing.
    pub(crate) fn push_waiter(&mut self, waiter: W) {
        assert!(
            self.value.is_none(),
            "taker queued while the slot holds a ready value"
        );
        self.waiters.enqueue(waiter);
    }

    /// Dequeue the oldest waiter, handing its ownership to the caller.
    pub(crate) fn pop_waiter(&mut self) -> Option<W> {
        self.waiters.dequeue()
    }

    /// `true` iff a take on this slot would resolve synchronously.
    pub(crate) fn is_ready(&self) -> bool {
        self.waiters.is_empty() && self.value.is_some()
    }

    /// Number of queued waiters.
    pub(crate) fn wait_count(&self) -> usize {
        self.waiters.len()
    }
}

/// Mapping from key to slot, created lazily and owned by the engine.
#[derive(Debug)]
pub(crate) struct SlotRegistry<W> {
    slots: HashMap<String, Slot<W>>,
}

impl<W> SlotRegistry<W> {
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    /// The slot for `key`, created empty on first reference.
    pub(crate) fn slot_mut(&mut self, key: &str) -> &mut Slot<W> {
        self.slots
            .entry(key.to_owned())
            .or_insert_with(Slot::new)
    }

    /// The slot for `key`, if it has ever been referenced.
    pub(crate) fn get(&self, key: &str) -> Option<&Slot<W>> {
        self.slots.get(key)
    }
}
