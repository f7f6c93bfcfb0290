//! Asset resolution: turns image references into decoded images.
//!
//! A reference may be inline base64 data (with or without a `data:` URI
//! prefix), an `http(s)://` URL, or a path under the configured asset
//! directory. Fetched and decoded images are cached so a batch job does not
//! re-download its base image for every row. All outbound requests carry a
//! bounded timeout so one stalled fetch cannot hang a whole batch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use image::DynamicImage;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::MaquetaError;

/// Default timeout for outbound asset fetches.
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Resolves and caches external image assets.
pub struct AssetResolver {
    asset_dir: PathBuf,
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, DynamicImage>>>,
}

impl AssetResolver {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Result<Self, MaquetaError> {
        Self::with_timeout(asset_dir, Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        asset_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, MaquetaError> {
        let http_client = reqwest::Client::builder()
            .user_agent("maqueta/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| MaquetaError::AssetLoad(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            asset_dir: asset_dir.into(),
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Resolve an image reference to a decoded image.
    ///
    /// Resolution order: `data:` URI → URL → local path → raw base64.
    pub async fn resolve(&self, source: &str) -> Result<DynamicImage, MaquetaError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(MaquetaError::AssetLoad("empty image reference".into()));
        }

        if let Some(encoded) = strip_data_uri(source) {
            return decode_base64_image(encoded);
        }

        if source.starts_with("http://") || source.starts_with("https://") {
            return self.fetch(source).await;
        }

        let path = self.asset_dir.join(source);
        if path.is_file() {
            let bytes = tokio::fs::read(&path).await?;
            return image::load_from_memory(&bytes).map_err(|e| {
                MaquetaError::AssetLoad(format!("Failed to decode {}: {}", path.display(), e))
            });
        }

        // Last resort: the reference may be bare base64 without a prefix.
        if looks_like_base64(source) {
            return decode_base64_image(source);
        }

        Err(MaquetaError::AssetLoad(format!(
            "unresolvable image reference: {}",
            truncate_for_log(source)
        )))
    }

    /// Fetch a URL, consulting the cache first.
    async fn fetch(&self, url: &str) -> Result<DynamicImage, MaquetaError> {
        {
            let cache = self.cache.read().await;
            if let Some(img) = cache.get(url) {
                return Ok(img.clone());
            }
        }

        debug!(url, "fetching asset");
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| MaquetaError::AssetLoad(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(MaquetaError::AssetLoad(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MaquetaError::AssetLoad(format!("Failed to read image data: {}", e)))?;

        let img = image::load_from_memory(&bytes)
            .map_err(|e| MaquetaError::AssetLoad(format!("Failed to decode {}: {}", url, e)))?;

        let mut cache = self.cache.write().await;
        cache.insert(url.to_string(), img.clone());
        Ok(img)
    }
}

/// Strip a `data:<mime>;base64,` prefix, returning the payload.
fn strip_data_uri(source: &str) -> Option<&str> {
    let rest = source.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(";base64,")?;
    Some(payload)
}

fn decode_base64_image(encoded: &str) -> Result<DynamicImage, MaquetaError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| MaquetaError::AssetLoad(format!("Invalid base64 image data: {}", e)))?;
    image::load_from_memory(&bytes)
        .map_err(|e| MaquetaError::AssetLoad(format!("Failed to decode inline image: {}", e)))
}

/// Heuristic: long enough to be an encoded image and alphabet-clean.
fn looks_like_base64(source: &str) -> bool {
    source.len() >= 64
        && source
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'=')
}

fn truncate_for_log(source: &str) -> String {
    if source.chars().count() > 48 {
        let head: String = source.chars().take(48).collect();
        format!("{}…", head)
    } else {
        source.to_string()
    }
}
