//! Batch job model: per-row results and polled progress.

pub mod runner;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rows::RowSet;

/// User-chosen association from variable id to source column name.
pub type Mapping = HashMap<String, String>;

/// Overall lifecycle of a job. `Done` is terminal; a job is never reported
/// as failed — per-row outcomes carry the mixed results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
}

/// Terminal state of a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Pending,
    Done,
    Skipped,
    Error,
}

/// Outcome of one row, indexed by row number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowResult {
    pub index: usize,
    pub status: RowStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RowResult {
    fn pending(index: usize) -> Self {
        Self {
            index,
            status: RowStatus::Pending,
            url: None,
            message: None,
        }
    }
}

/// One batch-render request spanning many rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Integer percent in [0, 100], updated after every row.
    pub progress: u8,
    /// One slot per row, preallocated so row updates never append.
    pub results: Vec<RowResult>,
    pub rows: RowSet,
    pub mapping: Mapping,
    pub template_id: String,
    #[serde(default)]
    pub identifier_column: Option<String>,
    #[serde(default)]
    pub skip_processed: bool,
    #[serde(default)]
    pub owner: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Job {
    /// Create a job at the start of a batch: running, zero progress, every
    /// row pending.
    pub fn new(
        template_id: impl Into<String>,
        rows: RowSet,
        mapping: Mapping,
        identifier_column: Option<String>,
        skip_processed: bool,
        owner: Option<String>,
    ) -> Self {
        let results = (0..rows.len()).map(RowResult::pending).collect();
        Self {
            id: Uuid::new_v4().simple().to_string(),
            status: JobStatus::Running,
            progress: 0,
            results,
            rows,
            mapping,
            template_id: template_id.into(),
            identifier_column,
            skip_processed,
            owner,
            created_at: chrono::Utc::now(),
        }
    }

    /// Rows with a terminal status.
    pub fn completed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status != RowStatus::Pending)
            .count()
    }

    /// Progress for readers: the stored value, raised to the recomputed
    /// value when counting results gives a higher number. Guards against a
    /// crash after a row completed but before progress persisted.
    pub fn effective_progress(&self) -> u8 {
        self.progress.max(progress_percent(self.completed_count(), self.results.len()))
    }
}

/// `floor(completed / total * 100)`, with an empty batch counting as done.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed * 100) / total) as u8
}
