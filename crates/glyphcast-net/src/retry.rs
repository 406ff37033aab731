use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::sleep;
use url::Url;

use crate::{
    error::NetError,
    traits::Net,
    types::{Headers, RetryPolicy},
};

/// Decides whether a failed request may be re-issued and how long to wait.
pub trait RetrySchedule: Send + Sync {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool;
    fn delay_for_attempt(&self, attempt: u32) -> Duration;
    fn max_attempts(&self) -> u32;
}

/// Schedule driven by [`RetryPolicy`] and [`NetError::is_retryable`].
pub struct DefaultRetryPolicy {
    policy: RetryPolicy,
}

impl DefaultRetryPolicy {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }
}

impl RetrySchedule for DefaultRetryPolicy {
    fn should_retry(&self, error: &NetError, attempt: u32) -> bool {
        attempt < self.policy.max_retries && error.is_retryable()
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.policy.delay_for_attempt(attempt)
    }

    fn max_attempts(&self) -> u32 {
        self.policy.max_retries
    }
}

/// Retry decorator for [`Net`] implementations.
///
/// The streaming core never retries; transient-failure recovery lives
/// entirely in this transport layer.
pub struct RetryNet<N, P> {
    inner: N,
    schedule: P,
}

impl<N: Net, P: RetrySchedule> RetryNet<N, P> {
    pub fn new(inner: N, schedule: P) -> Self {
        Self { inner, schedule }
    }
}

#[async_trait]
impl<N: Net, P: RetrySchedule> Net for RetryNet<N, P> {
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError> {
        let max_attempts = self.schedule.max_attempts();
        let mut attempt = 0;

        loop {
            match self.inner.get_bytes(url.clone(), headers.clone()).await {
                Ok(bytes) => return Ok(bytes),
                Err(error) if self.schedule.should_retry(&error, attempt) => {
                    tracing::debug!(url = %url, attempt, error = %error, "retrying request");
                    attempt += 1;
                    sleep(self.schedule.delay_for_attempt(attempt)).await;
                }
                Err(error) if attempt >= max_attempts && error.is_retryable() => {
                    return Err(NetError::RetryExhausted {
                        max_retries: max_attempts,
                        source: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
