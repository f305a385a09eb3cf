use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use super::{ContentLoadError, ContentLoader, ContentSource};

pub fn user_agent() -> &'static str {
    concat!("civic/", env!("CARGO_PKG_VERSION"))
}

/// Shared client for every remote loader in a run.
pub fn http_client() -> Result<Client, ContentLoadError> {
    Client::builder()
        .user_agent(user_agent())
        .build()
        .map_err(ContentLoadError::Client)
}

#[derive(Debug)]
pub struct RemoteLoader {
    url: Url,
    source: ContentSource,
    client: Client,
    timeout: Duration,
    content: OnceCell<Bytes>,
}

impl RemoteLoader {
    pub fn new(url: Url, client: Client, timeout: Duration) -> Self {
        Self {
            source: ContentSource::Remote(url.clone()),
            url,
            client,
            timeout,
            content: OnceCell::new(),
        }
    }

    async fn fetch(&self) -> Result<Bytes, ContentLoadError> {
        let started_at = Instant::now();
        let http_error = |source| ContentLoadError::Http {
            url: self.url.to_string(),
            source,
        };

        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(
                target = "infra::loader",
                op = "loader::remote",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                url = %self.url,
                status = status.as_u16(),
                error_code = "http_status",
                "Remote content request was not successful"
            );
            return Err(ContentLoadError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(http_error)?;
        debug!(
            target = "infra::loader",
            op = "loader::remote",
            result = "ok",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            url = %self.url,
            bytes = body.len(),
            "Loaded remote content"
        );
        Ok(body)
    }
}

#[async_trait]
impl ContentLoader for RemoteLoader {
    fn source(&self) -> &ContentSource {
        &self.source
    }

    async fn load(&self) -> Result<Bytes, ContentLoadError> {
        self.content
            .get_or_try_init(|| self.fetch())
            .await
            .cloned()
    }
}
