//! Single-context affine exchange.
//!
//! The degenerate variant of the exchange for tasks that all live in one
//! execution context: no broker, no liveness probing. Inside one context a
//! waiter cannot silently become unreachable — the only way a pending `take`
//! disappears is its future being dropped, and that closes the waiter's
//! channel, which `give` observes directly. So where the brokered exchange
//! needs a probe-and-timeout handshake, this one just skips closed channels.
//!
//! Handles are `Rc`-shared and deliberately single-threaded (`!Send`); values
//! stay typed and move through untouched, no codec involved.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::FifoQueue;

/// A single-slot, use-at-most-once value exchange for one execution context.
///
/// One task may [`give`](Self::give) a value; exactly one
/// [`take`](Self::take) receives it, FIFO among concurrent takers. A value is
/// moved to its taker, never cloned, and the slot cannot yield the same value
/// twice.
pub struct LocalAffine<T> {
    inner: Rc<RefCell<LocalState<T>>>,
}

struct LocalState<T> {
    /// A parked value; only ever `Some` while the wait queue is empty.
    ready: Option<T>,
    waiters: FifoQueue<oneshot::Sender<T>>,
}

impl<T> LocalAffine<T> {
    /// Create an empty exchange.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LocalState {
                ready: None,
                waiters: FifoQueue::new(),
            })),
        }
    }

    /// Take the value once it exists.
    ///
    /// Resolves immediately when a value is parked; otherwise suspends until
    /// a future [`give`](Self::give). No timeout is imposed — callers wanting
    /// a bounded wait wrap the call themselves.
    pub async fn take(&self) -> T {
        let receiver = {
            let mut state = self.inner.borrow_mut();
            if let Some(value) = state.ready.take() {
                return value;
            }
            let (sender, receiver) = oneshot::channel();
            state.waiters.enqueue(sender);
            receiver
        };

        match receiver.await {
            Ok(value) => value,
            // The sender sits in our own wait queue, which this future keeps
            // alive; losing it without a send means the queue discipline is
            // broken.
            Err(_) => panic!("local exchange dropped a queued waiter"),
        }
    }

    /// Provide a value to the oldest pending `take`, or park it for the next
    /// one.
    ///
    /// A queued taker whose future has been dropped is skipped; its channel
    /// is closed, so the value simply moves on to the next waiter in FIFO
    /// order.
    ///
    /// # Panics
    ///
    /// Panics when a value is already parked and nobody is waiting: the slot
    /// holds at most one undelivered value, and overwriting it would lose
    /// data silently.
    pub fn give(&self, value: T) {
        let mut state = self.inner.borrow_mut();
        let mut value = value;
        while let Some(waiter) = state.waiters.dequeue() {
            match waiter.send(value) {
                Ok(()) => return,
                // Take future dropped after queuing; the send hands the
                // value back so it can go to the next waiter.
                Err(returned) => value = returned,
            }
        }

        assert!(
            state.ready.is_none(),
            "value given while the slot already holds an undelivered value"
        );
        state.ready = Some(value);
    }

    /// `true` iff the next [`take`](Self::take) would resolve immediately.
    pub fn is_ready(&self) -> bool {
        let state = self.inner.borrow();
        state.waiters.is_empty() && state.ready.is_some()
    }

    /// Number of queued takers.
    ///
    /// Counts every queued channel, including takers that have since been
    /// dropped; those are only discovered and discarded by the next `give`.
    pub fn wait_count(&self) -> usize {
        self.inner.borrow().waiters.len()
    }
}

impl<T> Clone for LocalAffine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for LocalAffine<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::pin;
    use std::task::Poll;

    use super::*;

    #[tokio::test]
    async fn test_give_then_take() {
        let affine = LocalAffine::new();
        affine.give(1u32);
        assert!(affine.is_ready());
        assert_eq!(affine.take().await, 1);
        assert!(!affine.is_ready());
    }

    #[tokio::test]
    async fn test_take_then_give_resolves_pending() {
        let affine = LocalAffine::new();
        let taker = affine.clone();

        let (value, ()) = tokio::join!(taker.take(), async {
            affine.give(2u32);
        });
        assert_eq!(value, 2);
        assert!(!affine.is_ready());
        assert_eq!(affine.wait_count(), 0);
    }

    #[tokio::test]
    async fn test_fifo_order_among_takers() {
        let affine = LocalAffine::new();

        let mut first = pin!(affine.take());
        let mut second = pin!(affine.take());

        // Register both waiters, oldest first.
        std::future::poll_fn(|cx| {
            assert!(first.as_mut().poll(cx).is_pending());
            assert!(second.as_mut().poll(cx).is_pending());
            Poll::Ready(())
        })
        .await;
        assert_eq!(affine.wait_count(), 2);

        affine.give("for-first");
        affine.give("for-second");

        assert_eq!(first.await, "for-first");
        assert_eq!(second.await, "for-second");
    }

    #[tokio::test]
    async fn test_cancelled_take_is_skipped() {
        let affine = LocalAffine::new();

        {
            let mut abandoned = pin!(affine.take());
            std::future::poll_fn(|cx| {
                assert!(abandoned.as_mut().poll(cx).is_pending());
                Poll::Ready(())
            })
            .await;
            // Dropped here: the queued channel closes.
        }
        assert_eq!(affine.wait_count(), 1);

        // The give walks past the dead waiter and parks the value.
        affine.give(7u32);
        assert!(affine.is_ready());
        assert_eq!(affine.wait_count(), 0);
        assert_eq!(affine.take().await, 7);
    }

    #[test]
    #[should_panic(expected = "already holds an undelivered value")]
    fn test_double_give_panics() {
        let affine = LocalAffine::new();
        affine.give(1u32);
        affine.give(2u32);
    }

    #[tokio::test]
    async fn test_values_move_not_clone() {
        // A non-Clone type flows through the exchange.
        #[derive(Debug, PartialEq)]
        struct Unique(String);

        let affine = LocalAffine::new();
        affine.give(Unique("only-copy".to_string()));
        assert_eq!(affine.take().await, Unique("only-copy".to_string()));
    }
}
