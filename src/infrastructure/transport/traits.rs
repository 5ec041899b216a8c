use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use reqwest::Url;

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body and return the raw response body.
    ///
    /// Timeouts, TLS and connection reuse are the implementation's concern.
    async fn post_json(&self, url: Url, headers: HeaderMap, body: Vec<u8>) -> anyhow::Result<Bytes>;
}
