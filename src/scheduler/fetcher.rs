//! Fetching a single image to disk

use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::document::{DownloadedResource, Resource};
use crate::error::{Error, Result};
use crate::retry::with_retry;

/// Abstraction over downloading one [`Resource`], enabling testability
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Download `resource` into `dest_dir` and return it once the file is
    /// fully written and closed
    ///
    /// Implementations must stop promptly when `cancel` fires and must not
    /// leave a partially written file behind on failure.
    async fn fetch(
        &self,
        resource: &Resource,
        dest_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadedResource>;
}

/// Production [`ResourceFetcher`] streaming images over HTTP
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryConfig,
}

impl HttpFetcher {
    /// Create a fetcher sharing `client`
    pub fn new(client: reqwest::Client, retry: RetryConfig) -> Self {
        Self { client, retry }
    }

    async fn fetch_once(&self, url: &str, path: &Path, cancel: &CancellationToken) -> Result<()> {
        let result = tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            written = self.stream_to_file(url, path) => written,
        };

        if result.is_err() {
            remove_partial(path).await;
        }
        result
    }

    async fn stream_to_file(&self, url: &str, path: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(url, e))?;

        if !response.status().is_success() {
            return Err(Error::http_status(url, response.status()));
        }

        let mut file = tokio::fs::File::create(path).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::transport(url, e))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(
        &self,
        resource: &Resource,
        dest_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<DownloadedResource> {
        let path = dest_dir.join(resource.file_name());
        let (url, dest) = (resource.url.as_str(), path.as_path());

        with_retry(&self.retry, cancel, move || self.fetch_once(url, dest, cancel)).await?;

        Ok(DownloadedResource {
            resource: resource.clone(),
            local_path: path,
        })
    }
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial image");
    }
}
