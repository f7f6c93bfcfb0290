//! Storage interfaces and the in-memory implementation.
//!
//! The core is written against repository traits so it stays testable
//! without a database: templates and jobs by primary key, plus a
//! deduplication store of processed identifiers with idempotent inserts.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::MaquetaError;
use crate::job::{Job, JobStatus, RowResult};
use crate::template::Template;

/// Template retrieval/update by primary key.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, id: &str) -> Result<Option<Template>, MaquetaError>;
    async fn put_template(&self, template: Template) -> Result<(), MaquetaError>;
    async fn list_templates(&self) -> Result<Vec<Template>, MaquetaError>;
}

/// Job retrieval and per-row incremental updates.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn get_job(&self, id: &str) -> Result<Option<Job>, MaquetaError>;
    async fn put_job(&self, job: Job) -> Result<(), MaquetaError>;

    /// Persist one row's outcome plus the new progress in a single update,
    /// so pollers never observe a result without its progress bump.
    async fn update_row(
        &self,
        job_id: &str,
        result: RowResult,
        progress: u8,
        result_url: Option<String>,
    ) -> Result<(), MaquetaError>;

    /// Transition the job's overall status. `Done` is terminal.
    async fn set_status(&self, job_id: &str, status: JobStatus) -> Result<(), MaquetaError>;
}

/// Deduplication collaborator over processed identifiers.
///
/// Scope is global across templates, matching the observed behavior of the
/// system this replaces; see DESIGN.md before narrowing it.
#[async_trait]
pub trait ProcessedStore: Send + Sync {
    /// Record an identifier as processed. Returns `true` when it was new.
    /// Idempotent: concurrent duplicate inserts must not error.
    async fn mark_processed(&self, identifier: &str) -> Result<bool, MaquetaError>;

    async fn is_processed(&self, identifier: &str) -> Result<bool, MaquetaError>;
}
