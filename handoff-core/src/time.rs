//! Time provider abstraction.
//!
//! Liveness deadlines run through [`TimeProvider`] rather than calling tokio
//! directly, so embedders and tests can substitute their own notion of time
//! (a deterministic clock, a frozen clock) without touching the exchange
//! logic. [`TokioTimeProvider`] is the production implementation.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during time operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The deadline elapsed before the wrapped future completed.
    #[error("operation timed out")]
    Elapsed,
}

/// Provider trait for sleeping and bounding futures with a deadline.
#[async_trait]
pub trait TimeProvider: Clone + Send + Sync + 'static {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration);

    /// Run a future against a deadline.
    ///
    /// Resolves `Ok(output)` if the future completes in time, or
    /// `Err(TimeError::Elapsed)` once the deadline passes. The future is
    /// dropped on timeout.
    async fn timeout<F, R>(&self, duration: Duration, future: F) -> Result<R, TimeError>
    where
        F: Future<Output = R> + Send,
        R: Send;
}

/// Real time provider using tokio's timer facilities.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimeProvider;

impl TokioTimeProvider {
    /// Create a new tokio time provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn timeout<F, R>(&self, duration: Duration, future: F) -> Result<R, TimeError>
    where
        F: Future<Output = R> + Send,
        R: Send,
    {
        tokio::time::timeout(duration, future)
            .await
            .map_err(|_| TimeError::Elapsed)
    }
}
