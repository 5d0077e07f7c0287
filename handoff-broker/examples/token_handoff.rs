//! Token Handoff Example: passing a use-at-most-once credential between tasks.
//!
//! A refresher task periodically gives a fresh session token; worker tasks
//! take it. The exchange guarantees each token is consumed by exactly one
//! worker — no double-spend — and that workers queue FIFO when no token is
//! available yet.
//!
//! ```bash
//! cargo run --example token_handoff
//! ```

use std::time::Duration;

use handoff_broker::{Broker, ExchangeConfig};
use serde::{Deserialize, Serialize};

/// A credential that must only ever be used once.
#[derive(Debug, Serialize, Deserialize)]
struct SessionToken {
    serial: u32,
    secret: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handoff_broker=debug".into()),
        )
        .init();

    let broker = Broker::spawn(ExchangeConfig::default());

    // The refresher: mints a token, waits for it to be consumed, mints the
    // next one.
    let minter = broker.handle::<SessionToken>("session-token");
    tokio::spawn(async move {
        for serial in 0.. {
            minter
                .give(SessionToken {
                    serial,
                    secret: format!("secret-{serial:04}"),
                })
                .await
                .expect("broker should accept the token");
            while minter.is_ready().await.expect("broker should answer") {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    });

    // Three workers race for tokens; each token lands in exactly one.
    let mut workers = Vec::new();
    for id in 0..3 {
        let slot = broker.handle::<SessionToken>("session-token");
        workers.push(tokio::spawn(async move {
            for _ in 0..2 {
                let token = slot.take().await.expect("take should resolve");
                println!("worker {id} holds token #{} ({})", token.serial, token.secret);
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }));
    }

    for worker in workers {
        worker.await?;
    }
    println!("every token was consumed exactly once");
    Ok(())
}
