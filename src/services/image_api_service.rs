use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::services::store::{PhotoSource, StoreError, StoreResult};

#[derive(Deserialize)]
struct ImageListResponse {
    #[serde(default)]
    images: Vec<ImageMeta>,
}

#[derive(Deserialize)]
struct ImageMeta {
    url: String,
}

/// Reads a profile's photo list from the image service.
#[derive(Clone)]
pub struct ImageApiPhotoSource {
    client: reqwest::Client,
    base_url: String,
    host_header: Option<String>,
}

impl ImageApiPhotoSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            host_header: None,
        }
    }

    /// Many dev setups route every service through one ingress and select it
    /// by Host header (image.localhost, ...).
    pub fn with_host_header(mut self, host: impl Into<String>) -> Self {
        self.host_header = Some(host.into());
        self
    }

    pub fn photos_url(&self, profile_id: &str) -> String {
        format!(
            "{}/api/v1/profiles/{}/images?size=medium",
            self.base_url.trim_end_matches('/'),
            profile_id
        )
    }

    /// The image API hands out storage paths like "/storage/users/..."; make
    /// them absolute against the base url.
    pub fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl PhotoSource for ImageApiPhotoSource {
    async fn fetch_photos(&self, profile_id: &str) -> StoreResult<Vec<String>> {
        let url = self.photos_url(profile_id);
        debug!(%url, "fetching photo list");

        let mut request = self.client.get(&url);
        if let Some(host) = &self.host_header {
            request = request.header("Host", host);
        }
        let resp = request.send().await.map_err(|e| StoreError::Upstream {
            status: 502,
            detail: format!("connect failed for {}: {}", url, e),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Upstream {
                status: status.as_u16(),
                detail: format!("image api returned {} for {}", status, profile_id),
            });
        }

        let body: ImageListResponse = resp.json().await.map_err(|e| StoreError::Upstream {
            status: 502,
            detail: format!("invalid photo list json: {}", e),
        })?;

        Ok(body
            .images
            .into_iter()
            .map(|meta| meta.url)
            .filter(|url| !url.trim().is_empty())
            .map(|url| self.absolute_url(&url))
            .collect())
    }
}
