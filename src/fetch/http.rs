use super::Fetch;
use crate::{
    error::{CacheError, CacheResult, NetworkError},
    source::Source,
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

/// Fetches network identifiers with a single HTTP GET request.
///
/// The full response body is buffered before being returned. Non-success
/// status codes are reported as [`NetworkError::Status`]; no redirects beyond
/// the client's own policy, retries, or ranged resumption are attempted.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    /// A reqwest client instance used to send each GET request.
    pub client: Client,
}

impl HttpFetcher {
    #[must_use]
    /// Create a fetcher sending requests through `client`.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, source: &Source) -> CacheResult<Vec<u8>> {
        let url = match source {
            Source::Network(url) => url,
            Source::Bundle { .. } => return Err(CacheError::Unsupported),
        };

        let transport = |e: reqwest::Error| NetworkError::Transport {
            url: url.to_string(),
            source: Arc::new(e),
        };

        debug!("Requesting {}.", url);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = resp.bytes().await.map_err(transport)?;

        debug!("Received {} bytes from {}.", body.len(), url);

        Ok(body.to_vec())
    }
}
