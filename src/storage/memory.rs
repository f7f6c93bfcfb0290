//! In-memory storage backed by `RwLock`-guarded maps.
//!
//! The default backend for a single-process deployment and for tests. All
//! maps live behind one store value which is cheap to clone and share.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::MaquetaError;
use crate::job::{Job, JobStatus, RowResult};
use crate::rows::RESULT_COLUMN;
use crate::storage::{JobStore, ProcessedStore, TemplateStore};
use crate::template::Template;

/// In-memory implementation of all three store traits.
#[derive(Clone, Default)]
pub struct MemoryStore {
    templates: Arc<RwLock<HashMap<String, Template>>>,
    jobs: Arc<RwLock<HashMap<String, Job>>>,
    processed: Arc<RwLock<HashSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_template(&self, id: &str) -> Result<Option<Template>, MaquetaError> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn put_template(&self, template: Template) -> Result<(), MaquetaError> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template);
        Ok(())
    }

    async fn list_templates(&self) -> Result<Vec<Template>, MaquetaError> {
        let mut all: Vec<Template> = self.templates.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn get_job(&self, id: &str) -> Result<Option<Job>, MaquetaError> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn put_job(&self, job: Job) -> Result<(), MaquetaError> {
        self.jobs.write().await.insert(job.id.clone(), job);
        Ok(())
    }

    async fn update_row(
        &self,
        job_id: &str,
        result: RowResult,
        progress: u8,
        result_url: Option<String>,
    ) -> Result<(), MaquetaError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| MaquetaError::Storage(format!("unknown job: {}", job_id)))?;
        let index = result.index;
        if index >= job.results.len() {
            return Err(MaquetaError::Storage(format!(
                "row index {} out of range for job {}",
                index, job_id
            )));
        }
        if let Some(url) = result_url {
            job.rows.set_cell(index, RESULT_COLUMN, url);
        }
        job.results[index] = result;
        job.progress = progress;
        Ok(())
    }

    async fn set_status(&self, job_id: &str, status: JobStatus) -> Result<(), MaquetaError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| MaquetaError::Storage(format!("unknown job: {}", job_id)))?;
        // Done is terminal: never revert to Running.
        if job.status != JobStatus::Done {
            job.status = status;
        }
        Ok(())
    }
}

#[async_trait]
impl ProcessedStore for MemoryStore {
    async fn mark_processed(&self, identifier: &str) -> Result<bool, MaquetaError> {
        Ok(self.processed.write().await.insert(identifier.to_string()))
    }

    async fn is_processed(&self, identifier: &str) -> Result<bool, MaquetaError> {
        Ok(self.processed.read().await.contains(identifier))
    }
}
