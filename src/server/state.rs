//! Server state and configuration.

use std::sync::Arc;

use crate::job::runner::BatchRunner;
use crate::storage::{JobStore, ProcessedStore, TemplateStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Directory holding template base images and stored masks.
    pub asset_dir: String,
    /// Directory holding TTF/OTF fonts, addressed by identifier.
    pub font_dir: String,
    /// Directory for locally "uploaded" results when no remote host is set.
    pub output_dir: String,
    /// Remote image host endpoint; empty means upload locally.
    pub upload_endpoint: String,
    /// API key for the remote image host.
    pub upload_api_key: String,
    /// Timeout in seconds for outbound fetches and uploads.
    pub fetch_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            asset_dir: "assets".into(),
            font_dir: "fonts".into(),
            output_dir: "output".into(),
            upload_endpoint: String::new(),
            upload_api_key: String::new(),
            fetch_timeout_secs: 15,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub templates: Arc<dyn TemplateStore>,
    pub jobs: Arc<dyn JobStore>,
    pub processed: Arc<dyn ProcessedStore>,
    pub runner: BatchRunner,
}
