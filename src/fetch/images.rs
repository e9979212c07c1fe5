//! Image downloads
//!
//! Template and mockup previews live behind plain public URLs, so they are
//! fetched outside the API client: no credential, no throttle. Downloads
//! are cached per URL for an hour in a cache of their own, which a
//! `clear_cache` on the client does not touch.

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const IMAGE_CACHE_TTL_SECS: u64 = 3600;
const IMAGE_CACHE_CAPACITY: u64 = 256;

#[derive(Error, Debug)]
pub enum ImageFetchError {
    #[error("Download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),
}

/// Source of raw image bytes, keyed by URL
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch an image, or `None` when the download failed
    async fn fetch_image(&self, url: &str) -> Option<Arc<Vec<u8>>>;
}

/// Downloader with a time-bounded per-URL cache
pub struct ImageFetcher {
    client: Client,
    cache: Cache<String, Arc<Vec<u8>>>,
}

impl ImageFetcher {
    pub fn new() -> Self {
        ImageFetcher {
            client: Client::new(),
            cache: Cache::builder()
                .max_capacity(IMAGE_CACHE_CAPACITY)
                .time_to_live(Duration::from_secs(IMAGE_CACHE_TTL_SECS))
                .build(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageFetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for ImageFetcher {
    fn default() -> Self {
        ImageFetcher::new()
    }
}

#[async_trait]
impl ImageSource for ImageFetcher {
    async fn fetch_image(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        self.cache
            .optionally_get_with(url.to_string(), async {
                match self.download(url).await {
                    Ok(bytes) => {
                        debug!(url = %url, bytes = bytes.len(), "Image downloaded");
                        Some(Arc::new(bytes))
                    }
                    Err(err) => {
                        warn!(url = %url, error = %err, "Image download failed");
                        None
                    }
                }
            })
            .await
    }
}
