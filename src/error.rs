//! # Error Types
//!
//! This module defines error types used throughout the maqueta library.
//!
//! The taxonomy mirrors how failures propagate through a batch run: a missing
//! template base image aborts a whole render call, an unreadable slot asset
//! only skips that slot, and anything that fails while processing one row is
//! recorded on that row without stopping the batch.

use thiserror::Error;

/// Main error type for maqueta operations
#[derive(Debug, Error)]
pub enum MaquetaError {
    /// The template's base image could not be located. Aborts the render call.
    #[error("Template asset missing: {0}")]
    TemplateAssetMissing(String),

    /// A referenced slot asset (image value, mask) could not be read.
    /// Non-fatal: the slot is skipped.
    #[error("Asset load failed: {0}")]
    AssetLoad(String),

    /// Text layout or drawing error
    #[error("Layout error: {0}")]
    Layout(String),

    /// Remote upload failed or the uploader is misconfigured
    #[error("Upload error: {0}")]
    Upload(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for MaquetaError {
    fn from(e: image::ImageError) -> Self {
        MaquetaError::Image(e.to_string())
    }
}
