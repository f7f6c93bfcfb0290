//! Result upload: pushes encoded mockups to an asset host.
//!
//! The batch runner only sees the [`Uploader`] trait. `HttpUploader` posts
//! base64 payloads to an imgbb-style endpoint; `LocalUploader` writes files
//! under the output directory for offline runs. A misconfigured uploader
//! reports per-row errors rather than crashing a job.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use rand::Rng;
use serde::Deserialize;

use crate::error::MaquetaError;
use crate::naming::sanitize_identifier;

/// Destination for encoded result images.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload an encoded image under a public identifier; returns its URL.
    async fn upload(&self, bytes: &[u8], public_id: &str) -> Result<String, MaquetaError>;
}

/// Build the deterministic public identifier for one row's result.
///
/// Shape: `mockups/{template}/{row}-{name}-{suffix}-{timestamp}` where the
/// name is the sanitized company value and the suffix is a short random tag
/// to dodge collisions on re-runs.
pub fn public_id(template_id: &str, row_index: usize, name: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..6)
        .map(|_| {
            let chars = b"abcdefghijklmnopqrstuvwxyz0123456789";
            chars[rng.random_range(0..chars.len())] as char
        })
        .collect();
    let name = sanitize_identifier(name);
    let name = if name.is_empty() { "row" } else { &name };
    format!(
        "mockups/{}/{}-{}-{}-{}",
        template_id,
        row_index,
        name,
        suffix,
        Utc::now().timestamp()
    )
}

#[derive(Debug, Deserialize)]
struct HostResponse {
    data: HostData,
}

#[derive(Debug, Deserialize)]
struct HostData {
    url: String,
}

/// Uploads to an HTTP image host (imgbb-style form API).
pub struct HttpUploader {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpUploader {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self, MaquetaError> {
        if endpoint.is_empty() || api_key.is_empty() {
            return Err(MaquetaError::Upload(
                "upload endpoint or API key not configured".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent("maqueta/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| MaquetaError::Upload(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, bytes: &[u8], public_id: &str) -> Result<String, MaquetaError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        let form = [
            ("key", self.api_key.as_str()),
            ("image", encoded.as_str()),
            ("name", public_id),
        ];
        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| MaquetaError::Upload(format!("upload request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(MaquetaError::Upload(format!(
                "upload failed: HTTP {}",
                response.status()
            )));
        }
        let parsed: HostResponse = response
            .json()
            .await
            .map_err(|e| MaquetaError::Upload(format!("bad upload response: {}", e)))?;
        Ok(parsed.data.url)
    }
}

/// Writes results to the output directory and returns file URLs.
pub struct LocalUploader {
    output_dir: PathBuf,
}

impl LocalUploader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl Uploader for LocalUploader {
    async fn upload(&self, bytes: &[u8], public_id: &str) -> Result<String, MaquetaError> {
        // public_id contains slashes; flatten to a single file name.
        let file_name = format!("{}.jpg", public_id.replace('/', "_"));
        let path = self.output_dir.join(&file_name);
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(format!("file://{}", path.display()))
    }
}
