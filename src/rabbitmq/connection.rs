use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::broker::{Broker, BrokerConnection};
use super::errors::{BrokerError, PubSubError, Result};

/// Bounded, fixed-interval retry policy for the initial connection.
///
/// Attempts are numbered from 1. After a failed attempt `n`, another attempt
/// is made only while `n <= max_retries`, so at most `max_retries + 1`
/// attempts happen in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_interval_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_interval_ms: u64) -> Self {
        Self {
            max_retries,
            retry_interval_ms,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    /// The single exit predicate of the retry loop.
    pub fn should_retry(&self, failed_attempt: u32) -> bool {
        failed_attempt <= self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, 2000)
    }
}

/// Outcome of an exhausted retry loop.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Runs `operation` until it succeeds or the policy gives up.
///
/// The operation receives the current attempt number. Waiting between
/// attempts uses `tokio::time::sleep`, so other tasks keep running.
pub async fn retry<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> std::result::Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !policy.should_retry(attempt) {
                    error!(
                        attempt,
                        max_retries = policy.max_retries(),
                        "Max connection attempts reached. Giving up: {}",
                        err
                    );
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }

                warn!(
                    attempt,
                    max_retries = policy.max_retries(),
                    "Attempt failed: {}",
                    err
                );
                debug!(
                    "Retrying in {}ms",
                    policy.retry_interval().as_millis()
                );
                sleep(policy.retry_interval()).await;
                attempt += 1;
            }
        }
    }
}

/// Opens broker connections under a [`RetryPolicy`].
pub struct ConnectionOpener {
    broker: Arc<dyn Broker>,
    policy: RetryPolicy,
}

impl ConnectionOpener {
    pub fn new(broker: Arc<dyn Broker>, policy: RetryPolicy) -> Self {
        Self { broker, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn open(&self, uri: &str) -> Result<Box<dyn BrokerConnection>> {
        info!("Connecting to RabbitMQ");

        let broker = &self.broker;
        let connection = retry(self.policy, |attempt| async move {
            debug!(attempt, "Attempting to connect to RabbitMQ");
            broker.connect(uri).await
        })
        .await
        .map_err(|exhausted: RetryExhausted<BrokerError>| PubSubError::Connection {
            attempts: exhausted.attempts,
            source: exhausted.last_error,
        })?;

        info!("Successfully connected to RabbitMQ");
        Ok(connection)
    }
}
