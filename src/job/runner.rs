//! Batch job runner: sequential per-row render, upload, and progress
//! persistence.
//!
//! One job is one sequential loop; a row failure is recorded on that row and
//! the loop continues. Rendering runs on a blocking thread so the serving
//! side stays responsive, with exactly one row in flight per job. Progress
//! is persisted after every row so pollers observe monotonic movement.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::assets::AssetResolver;
use crate::error::MaquetaError;
use crate::job::{progress_percent, Job, JobStatus, RowResult, RowStatus};
use crate::render::{encode_jpeg, resolve_value, Renderer, COMPANY_NAME_VARIABLE};
use crate::storage::{JobStore, ProcessedStore, TemplateStore};
use crate::template::Template;
use crate::upload::{public_id, Uploader};

/// Shared collaborators for running batch jobs.
#[derive(Clone)]
pub struct BatchRunner {
    pub templates: Arc<dyn TemplateStore>,
    pub jobs: Arc<dyn JobStore>,
    pub processed: Arc<dyn ProcessedStore>,
    pub uploader: Arc<dyn Uploader>,
    pub renderer: Arc<Renderer>,
    pub resolver: Arc<AssetResolver>,
}

/// Outcome of one row before it is persisted.
struct RowOutcome {
    status: RowStatus,
    url: Option<String>,
    message: Option<String>,
}

impl BatchRunner {
    /// Run a stored job to completion.
    ///
    /// Every row ends in a terminal status; the job itself always ends
    /// `Done`. Not cancellable; a crash mid-run leaves the job `Running`
    /// with partial results, which is the accepted recovery granularity.
    pub async fn run(&self, job_id: &str) -> Result<(), MaquetaError> {
        let job = self
            .jobs
            .get_job(job_id)
            .await?
            .ok_or_else(|| MaquetaError::Storage(format!("unknown job: {}", job_id)))?;

        let total = job.rows.len();
        info!(job_id, rows = total, "batch job started");

        for index in 0..total {
            let outcome = match self.process_row(&job, index).await {
                Ok(outcome) => outcome,
                Err(e) => RowOutcome {
                    status: RowStatus::Error,
                    url: None,
                    message: Some(e.to_string()),
                },
            };

            if outcome.status == RowStatus::Error {
                warn!(job_id, row = index, message = ?outcome.message, "row failed");
            }

            let result = RowResult {
                index,
                status: outcome.status,
                url: outcome.url.clone(),
                message: outcome.message,
            };
            let progress = progress_percent(index + 1, total);
            if let Err(e) = self.jobs.update_row(job_id, result, progress, outcome.url).await {
                // Persistence hiccups must not abort the batch either.
                error!(job_id, row = index, error = %e, "failed to persist row result");
            }
        }

        self.jobs.set_status(job_id, JobStatus::Done).await?;
        info!(job_id, "batch job done");
        Ok(())
    }

    /// Process one row end to end. Everything row-scoped lives inside this
    /// failure boundary, template loading included, so a bad row can never
    /// abort the job.
    async fn process_row(&self, job: &Job, index: usize) -> Result<RowOutcome, MaquetaError> {
        let identifier = job
            .identifier_column
            .as_deref()
            .and_then(|col| job.rows.cell(index, col))
            .map(str::trim)
            .unwrap_or("")
            .to_string();

        if job.skip_processed
            && !identifier.is_empty()
            && self.processed.is_processed(&identifier).await?
        {
            return Ok(RowOutcome {
                status: RowStatus::Skipped,
                url: None,
                message: None,
            });
        }

        let template = self
            .templates
            .get_template(&job.template_id)
            .await?
            .ok_or_else(|| {
                MaquetaError::Storage(format!("unknown template: {}", job.template_id))
            })?;

        let prepared = self
            .renderer
            .prepare(&template, &job.rows, index, &job.mapping, &self.resolver)
            .await?;

        let renderer = self.renderer.clone();
        let template_for_render = template.clone();
        let encoded = tokio::task::spawn_blocking(move || {
            let img = renderer.render(&template_for_render, prepared)?;
            encode_jpeg(&img)
        })
        .await
        .map_err(|e| MaquetaError::Image(format!("render task failed: {}", e)))??;

        let name = row_display_name(&template, job, index, &identifier);
        let url = self
            .uploader
            .upload(&encoded, &public_id(&template.id, index, &name))
            .await?;

        if !identifier.is_empty() {
            // Persisted immediately; duplicate inserts are idempotent.
            self.processed.mark_processed(&identifier).await?;
        }

        Ok(RowOutcome {
            status: RowStatus::Done,
            url: Some(url),
            message: None,
        })
    }
}

/// Human-meaningful name segment for the public upload id: the resolved
/// company name when the template has one, else the dedup identifier, else
/// a bare row marker.
fn row_display_name(template: &Template, job: &Job, index: usize, identifier: &str) -> String {
    let company = template
        .variables
        .iter()
        .find(|v| v.id == COMPANY_NAME_VARIABLE)
        .map(|v| resolve_value(v, template, &job.rows, index, &job.mapping))
        .unwrap_or_default();
    if !company.is_empty() {
        company
    } else {
        identifier.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Mapping;
    use crate::render::text::FontStore;
    use crate::rows::{Row, RowSet, RESULT_COLUMN};
    use crate::storage::MemoryStore;
    use crate::template::{BoundingBox, ImageStyle, Variable, VariableKind};
    use async_trait::async_trait;
    use base64::Engine;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts uploads; fails any row whose public id matches the poison tag.
    struct FakeUploader {
        uploads: AtomicUsize,
        poison: Option<String>,
    }

    impl FakeUploader {
        fn new(poison: Option<&str>) -> Self {
            Self {
                uploads: AtomicUsize::new(0),
                poison: poison.map(String::from),
            }
        }
    }

    #[async_trait]
    impl Uploader for FakeUploader {
        async fn upload(&self, _bytes: &[u8], public_id: &str) -> Result<String, MaquetaError> {
            if let Some(ref poison) = self.poison {
                if public_id.contains(poison) {
                    return Err(MaquetaError::Upload("host rejected image".into()));
                }
            }
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://img.example/{}", public_id))
        }
    }

    fn data_uri_base() -> String {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([120, 130, 140])));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    fn sample_template() -> Template {
        Template {
            id: "t1".into(),
            name: "demo".into(),
            base_image: data_uri_base(),
            variables: vec![Variable {
                id: "logo".into(),
                label: String::new(),
                bounds: BoundingBox::new(2, 2, 8, 8),
                kind: VariableKind::Image(ImageStyle::default()),
                default_value: String::new(),
            }],
            masks: vec![],
            owner: None,
            created_at: chrono::Utc::now(),
        }
    }

    fn sample_rows(companies: &[&str]) -> RowSet {
        let mut rows = RowSet::new(vec!["company".into()]);
        for c in companies {
            rows.rows.push(Row {
                cells: vec![c.to_string()],
            });
        }
        rows
    }

    fn runner_with(uploader: Arc<FakeUploader>, store: MemoryStore) -> BatchRunner {
        let store = Arc::new(store);
        BatchRunner {
            templates: store.clone(),
            jobs: store.clone(),
            processed: store,
            uploader,
            renderer: Arc::new(Renderer::new(FontStore::new("/nonexistent"))),
            resolver: Arc::new(AssetResolver::new("/nonexistent").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_batch_completes_all_rows() {
        let store = MemoryStore::new();
        store.put_template(sample_template()).await.unwrap();
        let job = Job::new(
            "t1",
            sample_rows(&["Acme", "Globex", "Initech"]),
            Mapping::new(),
            None,
            false,
            None,
        );
        let job_id = job.id.clone();
        store.put_job(job).await.unwrap();

        let uploader = Arc::new(FakeUploader::new(None));
        let runner = runner_with(uploader.clone(), store.clone());
        runner.run(&job_id).await.unwrap();

        let job = store.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, 100);
        assert_eq!(job.results.len(), 3);
        assert!(job.results.iter().all(|r| r.status == RowStatus::Done));
        assert!(job.rows.cell(2, RESULT_COLUMN).unwrap().starts_with("https://img.example/"));
        assert_eq!(uploader.uploads.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_one_bad_row_does_not_abort_batch() {
        let store = MemoryStore::new();
        store.put_template(sample_template()).await.unwrap();
        let job = Job::new(
            "t1",
            sample_rows(&["Acme", "Globex", "Initech"]),
            Mapping::new(),
            None,
            false,
            None,
        );
        let job_id = job.id.clone();
        store.put_job(job).await.unwrap();

        // Poison the public id of row 1.
        let uploader = Arc::new(FakeUploader::new(Some("/1-")));
        let runner = runner_with(uploader.clone(), store.clone());
        runner.run(&job_id).await.unwrap();

        let job = store.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, 100);
        assert_eq!(job.results[0].status, RowStatus::Done);
        assert_eq!(job.results[1].status, RowStatus::Error);
        assert!(job.results[1].message.as_deref().unwrap().contains("host rejected"));
        assert!(job.results[1].url.is_none());
        assert_eq!(job.results[2].status, RowStatus::Done);
    }

    #[tokio::test]
    async fn test_skip_processed_issues_no_uploads() {
        let store = MemoryStore::new();
        store.put_template(sample_template()).await.unwrap();
        store.mark_processed("Acme").await.unwrap();
        store.mark_processed("Globex").await.unwrap();

        let job = Job::new(
            "t1",
            sample_rows(&["Acme", "Globex"]),
            Mapping::new(),
            Some("company".into()),
            true,
            None,
        );
        let job_id = job.id.clone();
        store.put_job(job).await.unwrap();

        let uploader = Arc::new(FakeUploader::new(None));
        let runner = runner_with(uploader.clone(), store.clone());
        runner.run(&job_id).await.unwrap();

        let job = store.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(job.progress, 100);
        assert!(job.results.iter().all(|r| r.status == RowStatus::Skipped));
        assert!(job.results.iter().all(|r| r.url.is_none()));
        assert_eq!(uploader.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_identifiers_marked_processed_after_success() {
        let store = MemoryStore::new();
        store.put_template(sample_template()).await.unwrap();
        let job = Job::new(
            "t1",
            sample_rows(&["Acme"]),
            Mapping::new(),
            Some("company".into()),
            false,
            None,
        );
        let job_id = job.id.clone();
        store.put_job(job).await.unwrap();

        let runner = runner_with(Arc::new(FakeUploader::new(None)), store.clone());
        runner.run(&job_id).await.unwrap();

        assert!(store.is_processed("Acme").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_template_errors_every_row_but_finishes() {
        let store = MemoryStore::new();
        let job = Job::new(
            "missing-template",
            sample_rows(&["Acme", "Globex"]),
            Mapping::new(),
            None,
            false,
            None,
        );
        let job_id = job.id.clone();
        store.put_job(job).await.unwrap();

        let runner = runner_with(Arc::new(FakeUploader::new(None)), store.clone());
        runner.run(&job_id).await.unwrap();

        let job = store.get_job(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.progress, 100);
        assert!(job.results.iter().all(|r| r.status == RowStatus::Error));
    }
}
