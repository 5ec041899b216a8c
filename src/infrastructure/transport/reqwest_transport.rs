use super::traits::Transport;
use async_trait::async_trait;
use bytes::Bytes;
use http::HeaderMap;
use reqwest::Url;
use std::time::Duration;

const ERROR_BODY_PREVIEW: usize = 512;

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The underlying client, for fetching URL sources with the same
    /// settings.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, url: Url, headers: HeaderMap, body: Vec<u8>) -> anyhow::Result<Bytes> {
        let res = self
            .client
            .post(url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = res.status();
        let bytes = res.bytes().await?;
        if !status.is_success() {
            let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(ERROR_BODY_PREVIEW)]);
            anyhow::bail!("annotate request failed with {}: {}", status, preview);
        }
        Ok(bytes)
    }
}
