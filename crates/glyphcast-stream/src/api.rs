#![forbid(unsafe_code)]

//! Remote rendering service API.
//!
//! Two read-only endpoints:
//! - `GET {base}/files/{stream}/info` — stream metadata
//! - `GET {base}/files/{stream}?start_frame=N&frames=M` — a frame range;
//!   an empty `frames` object is the end-of-stream sentinel

use std::collections::BTreeMap;

use async_trait::async_trait;
use glyphcast_net::{Headers, HttpClient, Net};
use serde::Deserialize;
use url::Url;

use crate::error::{StreamError, StreamResult};

/// Stream metadata from the `info` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StreamInfo {
    pub fps: f64,
    pub original_width: u32,
    pub original_height: u32,
    pub frames_count: u64,
}

/// A fetched frame range. JSON object keys are frame indices as strings;
/// serde decodes them into integer map keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameBatch {
    pub fps: f64,
    pub original_width: u32,
    pub original_height: u32,
    pub frames: BTreeMap<u64, String>,
}

/// The remote rendering service seam.
#[cfg_attr(test, unimock::unimock(api = VideoApiMock))]
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Fetch stream metadata.
    async fn stream_info(&self, stream: &str) -> StreamResult<StreamInfo>;

    /// Fetch frames `[start_frame, start_frame + frames)`.
    async fn frame_range(
        &self,
        stream: &str,
        start_frame: u64,
        frames: u64,
    ) -> StreamResult<FrameBatch>;
}

/// HTTP implementation of [`VideoApi`] against a configured base URL.
#[derive(Clone, Debug)]
pub struct HttpVideoApi<N = HttpClient> {
    base_url: Url,
    net: N,
    headers: Option<Headers>,
}

impl<N: Net> HttpVideoApi<N> {
    pub fn new(mut base_url: Url, net: N) -> Self {
        // Url::join treats a base without a trailing slash as a file and
        // drops its last path segment on resolution.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            net,
            headers: None,
        }
    }

    /// Set additional HTTP headers for all requests.
    #[must_use]
    pub fn with_headers(mut self, headers: Option<Headers>) -> Self {
        self.headers = headers;
        self
    }

    fn resolve(&self, path: &str) -> StreamResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| StreamError::InvalidUrl(format!("failed to resolve {path}: {e}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> StreamResult<T> {
        let bytes = self.net.get_bytes(url.clone(), self.headers.clone()).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StreamError::Malformed(format!("{url}: {e}")))
    }
}

#[async_trait]
impl<N: Net> VideoApi for HttpVideoApi<N> {
    async fn stream_info(&self, stream: &str) -> StreamResult<StreamInfo> {
        let url = self.resolve(&format!("files/{stream}/info"))?;
        self.get_json(url).await
    }

    async fn frame_range(
        &self,
        stream: &str,
        start_frame: u64,
        frames: u64,
    ) -> StreamResult<FrameBatch> {
        let mut url = self.resolve(&format!("files/{stream}"))?;
        url.query_pairs_mut()
            .append_pair("start_frame", &start_frame.to_string())
            .append_pair("frames", &frames.to_string());
        self.get_json(url).await
    }
}
