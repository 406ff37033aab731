#![forbid(unsafe_code)]

mod client;
mod error;
mod retry;
mod traits;
mod types;

#[cfg(feature = "mock")]
pub mod mock;

pub use crate::{
    client::HttpClient,
    error::{NetError, NetResult},
    retry::{DefaultRetryPolicy, RetryNet},
    traits::{Net, NetExt},
    types::{Headers, NetOptions, RetryPolicy},
};
