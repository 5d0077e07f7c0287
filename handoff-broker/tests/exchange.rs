//! End-to-end exchange tests over the public client API.
//!
//! These run a real broker task and real client handles: requests, reply
//! channels, and the background delivery handshake are all exercised the way
//! an embedding application would.

use std::time::Duration;

use handoff_broker::{
    AffineHandle, Broker, ClientError, ExchangeConfig, MessageCodec, RejectReason,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

const DEADLINE: Duration = Duration::from_secs(5);

fn test_config() -> ExchangeConfig {
    ExchangeConfig::default().with_probe_timeout(Duration::from_millis(50))
}

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Poll until `slot` has at least `n` queued takers.
async fn wait_for_waiters<V, C>(slot: &AffineHandle<V, C>, n: usize)
where
    V: Serialize + DeserializeOwned,
    C: MessageCodec,
{
    for _ in 0..2000 {
        if slot.wait_count().await.expect("wait_count should succeed") >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("takers never queued");
}

#[tokio::test]
async fn test_give_then_take_returns_value() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<u32>("counter");

    slot.give(1).await.expect("give should be accepted");
    assert_eq!(slot.take().await.expect("take should resolve"), 1);
}

#[tokio::test]
async fn test_pending_take_resolved_by_future_give() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<u32>("pending");

    let taker = slot.clone();
    let pending = tokio::spawn(async move { taker.take().await });
    wait_for_waiters(&slot, 1).await;

    slot.give(2).await.expect("give should be accepted");

    let value = timeout(DEADLINE, pending)
        .await
        .expect("take should resolve before the deadline")
        .expect("take task should not panic")
        .expect("take should succeed");
    assert_eq!(value, 2);

    // The value was consumed in flight; nothing is parked.
    assert!(!slot.is_ready().await.expect("is_ready should succeed"));
    assert_eq!(slot.wait_count().await.expect("wait_count"), 0);
}

#[tokio::test]
async fn test_fifo_fairness_between_queued_takes() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<String>("fifo");

    let first_taker = slot.clone();
    let first = tokio::spawn(async move { first_taker.take().await });
    wait_for_waiters(&slot, 1).await;

    let second_taker = slot.clone();
    let second = tokio::spawn(async move { second_taker.take().await });
    wait_for_waiters(&slot, 2).await;

    slot.give("for-first".to_string())
        .await
        .expect("first give accepted");
    slot.give("for-second".to_string())
        .await
        .expect("second give accepted");

    let first = timeout(DEADLINE, first)
        .await
        .expect("first take resolves")
        .expect("no panic")
        .expect("take succeeds");
    let second = timeout(DEADLINE, second)
        .await
        .expect("second take resolves")
        .expect("no panic")
        .expect("take succeeds");

    assert_eq!(first, "for-first");
    assert_eq!(second, "for-second");
}

#[tokio::test]
async fn test_affinity_each_value_taken_exactly_once() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<u32>("affine");

    let mut pending = Vec::new();
    for i in 0..3 {
        let taker = slot.clone();
        pending.push(tokio::spawn(async move { taker.take().await }));
        wait_for_waiters(&slot, i + 1).await;
    }
    for value in [10, 20, 30] {
        slot.give(value).await.expect("give accepted");
    }

    let mut seen = Vec::new();
    for task in pending {
        let value = timeout(DEADLINE, task)
            .await
            .expect("take resolves")
            .expect("no panic")
            .expect("take succeeds");
        seen.push(value);
    }

    // Every given value observed by exactly one take, in queue order.
    assert_eq!(seen, vec![10, 20, 30]);
    assert!(!slot.is_ready().await.expect("is_ready"));
}

#[tokio::test]
async fn test_is_ready_and_wait_count_lifecycle() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<u32>("lifecycle");

    // Never-referenced key.
    assert!(!slot.is_ready().await.expect("is_ready"));
    assert_eq!(slot.wait_count().await.expect("wait_count"), 0);

    // Ready: parked value, no takers.
    slot.give(5).await.expect("give accepted");
    assert!(slot.is_ready().await.expect("is_ready"));
    assert_eq!(slot.wait_count().await.expect("wait_count"), 0);

    // is_ready promised a synchronous take; consume and it flips back.
    assert_eq!(slot.take().await.expect("take succeeds"), 5);
    assert!(!slot.is_ready().await.expect("is_ready"));

    // Pending: queued taker, no value.
    let taker = slot.clone();
    let pending = tokio::spawn(async move { taker.take().await });
    wait_for_waiters(&slot, 1).await;
    assert!(!slot.is_ready().await.expect("is_ready"));

    slot.give(6).await.expect("give accepted");
    assert_eq!(
        timeout(DEADLINE, pending)
            .await
            .expect("take resolves")
            .expect("no panic")
            .expect("take succeeds"),
        6
    );
}

#[tokio::test]
async fn test_give_onto_occupied_slot_is_rejected() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<u32>("occupied");

    slot.give(1).await.expect("first give accepted");
    let err = slot
        .give(2)
        .await
        .expect_err("second give must be rejected");
    assert!(matches!(
        err,
        ClientError::Rejected(RejectReason::SlotOccupied)
    ));

    // The resident value survived the rejected give.
    assert_eq!(slot.take().await.expect("take succeeds"), 1);
}

#[tokio::test]
async fn test_keys_are_independent() {
    init_logging();
    let broker = Broker::spawn(test_config());
    let left = broker.handle::<u32>("left");
    let right = broker.handle::<u32>("right");

    left.give(1).await.expect("give accepted");
    assert!(!right.is_ready().await.expect("is_ready"));
    right.give(2).await.expect("give accepted");

    assert_eq!(left.take().await.expect("take"), 1);
    assert_eq!(right.take().await.expect("take"), 2);
}

#[tokio::test]
async fn test_structured_payloads_roundtrip() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct SessionToken {
        id: u64,
        secret: String,
    }

    init_logging();
    let broker = Broker::spawn(test_config());
    let slot = broker.handle::<SessionToken>("session");

    slot.give(SessionToken {
        id: 7,
        secret: "one-owner-only".to_string(),
    })
    .await
    .expect("give accepted");

    let token = slot.take().await.expect("take succeeds");
    assert_eq!(
        token,
        SessionToken {
            id: 7,
            secret: "one-owner-only".to_string(),
        }
    );
}

#[tokio::test]
async fn test_falsy_values_are_delivered_not_dropped() {
    init_logging();
    let broker = Broker::spawn(test_config());

    let zero = broker.handle::<u32>("zero");
    zero.give(0).await.expect("give accepted");
    assert!(zero.is_ready().await.expect("is_ready"));
    assert_eq!(zero.take().await.expect("take"), 0);

    let fls = broker.handle::<bool>("false");
    fls.give(false).await.expect("give accepted");
    assert!(!fls.take().await.expect("take"));
}

#[test]
fn test_fail_fast_when_broker_gone() {
    let broker_rt = tokio::runtime::Runtime::new().expect("runtime should build");
    let handle = {
        let _guard = broker_rt.enter();
        Broker::spawn(test_config())
    };
    assert!(handle.is_running());

    // Tearing the runtime down kills the broker task.
    drop(broker_rt);
    assert!(!handle.is_running());

    let client_rt = tokio::runtime::Runtime::new().expect("runtime should build");
    client_rt.block_on(async {
        let slot = handle.handle::<u32>("gone");
        let err = slot.take().await.expect_err("must fail fast, not hang");
        assert!(matches!(err, ClientError::BrokerUnavailable));
        let err = slot.give(1).await.expect_err("must fail fast, not hang");
        assert!(matches!(err, ClientError::BrokerUnavailable));
    });
}

#[test]
fn test_broker_death_fails_pending_take() {
    let broker_rt = tokio::runtime::Runtime::new().expect("runtime should build");
    let handle = {
        let _guard = broker_rt.enter();
        Broker::spawn(test_config())
    };

    let client_rt = tokio::runtime::Runtime::new().expect("runtime should build");
    let slot = handle.handle::<u32>("doomed");

    let pending = client_rt.block_on(async {
        let taker = slot.clone();
        let pending = tokio::spawn(async move { taker.take().await });
        wait_for_waiters(&slot, 1).await;
        pending
    });

    // Broker dies with the take still queued; the queued waiter is dropped.
    drop(broker_rt);

    let result = client_rt.block_on(async {
        timeout(DEADLINE, pending)
            .await
            .expect("take must resolve, not hang")
            .expect("take task should not panic")
    });
    assert!(matches!(result, Err(ClientError::BrokerClosed)));
}
