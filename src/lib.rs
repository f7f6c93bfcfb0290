//! # Maqueta - Mockup Generation Backend
//!
//! Maqueta renders batches of branded mockup images: given an image template
//! with positioned text/image variable slots and a spreadsheet of rows, it
//! produces one composited image per row, optionally uploads each result to
//! an asset host, and tracks per-row progress for client polling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use maqueta::server::{serve, ServerConfig};
//!
//! # async fn example() -> Result<(), maqueta::error::MaquetaError> {
//! let config = ServerConfig {
//!     listen_addr: "0.0.0.0:8080".to_string(),
//!     ..Default::default()
//! };
//!
//! serve(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | Template, variable, and mask data model |
//! | [`render`] | Text layout, image fit, mask compositing, rendering |
//! | [`job`] | Batch jobs, per-row results, the runner |
//! | [`storage`] | Repository traits + in-memory backend |
//! | [`upload`] | Result upload to an asset host |
//! | [`rows`] | Tabular rows and the CSV codec |
//! | [`assets`] | Image reference resolution (base64/URL/path) |
//! | [`naming`] | Company-name shortening and id sanitization |
//! | [`error`] | Error types |

pub mod assets;
pub mod error;
pub mod job;
pub mod naming;
pub mod render;
pub mod rows;
pub mod server;
pub mod storage;
pub mod template;
pub mod upload;

// Re-exports for convenience
pub use error::MaquetaError;
pub use job::{Job, JobStatus, RowResult, RowStatus};
pub use template::Template;
