use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::{
    error::NetError,
    retry::{DefaultRetryPolicy, RetryNet},
    types::{Headers, RetryPolicy},
};

/// Abstraction over the HTTP client so the streaming core can be tested
/// without a network.
#[cfg_attr(any(test, feature = "mock"), unimock::unimock(api = NetMock))]
#[async_trait]
pub trait Net: Send + Sync {
    /// Fetch the full response body from a URL.
    async fn get_bytes(&self, url: Url, headers: Option<Headers>) -> Result<Bytes, NetError>;
}

pub trait NetExt: Net + Sized {
    /// Wrap with an exponential-backoff retry layer.
    fn with_retry(self, policy: RetryPolicy) -> RetryNet<Self, DefaultRetryPolicy> {
        RetryNet::new(self, DefaultRetryPolicy::new(policy))
    }
}

impl<T: Net> NetExt for T {}
