//! Batch job handlers: creation, polling, and results download.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::job::{Job, JobStatus, Mapping, RowResult};
use crate::rows::RowSet;

use super::super::state::AppState;
use super::{caller, owner_allows};

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub template_id: String,
    /// Raw CSV content with a first-row header.
    pub csv: String,
    #[serde(default)]
    pub mapping: Mapping,
    #[serde(default)]
    pub identifier_column: Option<String>,
    #[serde(default)]
    pub skip_processed: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub rows: usize,
}

/// Job detail for polling: status, progress, and every row's outcome.
#[derive(Debug, Serialize)]
pub struct JobDetail {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub results: Vec<RowResult>,
}

/// Handle POST /api/jobs — parse rows, persist the job, and spawn the
/// runner as an independent background task.
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<CreateJobResponse>, (StatusCode, String)> {
    let template = state
        .templates
        .get_template(&req.template_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("no template {}", req.template_id),
        ))?;
    let who = caller(&headers);
    if !owner_allows(&template.owner, &who) {
        return Err((StatusCode::FORBIDDEN, "not your template".into()));
    }

    let rows = RowSet::from_csv(&req.csv);
    if rows.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "no data rows in CSV".into()));
    }

    let job = Job::new(
        req.template_id,
        rows,
        req.mapping,
        req.identifier_column,
        req.skip_processed,
        who,
    );
    let job_id = job.id.clone();
    let total = job.rows.len();
    state
        .jobs
        .put_job(job)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let runner = state.runner.clone();
    let spawned_id = job_id.clone();
    tokio::spawn(async move {
        if let Err(e) = runner.run(&spawned_id).await {
            error!(job_id = %spawned_id, error = %e, "batch job failed to run");
        }
    });

    Ok(Json(CreateJobResponse {
        job_id,
        rows: total,
    }))
}

/// Handle GET /api/jobs/:id — poll status and per-row results.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<JobDetail>, (StatusCode, String)> {
    let job = fetch_job(&state, &headers, &id).await?;
    Ok(Json(JobDetail {
        id: job.id.clone(),
        status: job.status,
        // Defensive: never report progress lower than the counted results.
        progress: job.effective_progress(),
        results: job.results,
    }))
}

/// Handle GET /api/jobs/:id/results.csv — original columns plus the
/// appended mockup_url column, in the original row order.
pub async fn results_csv(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let job = fetch_job(&state, &headers, &id).await?;
    let body = job.rows.to_csv();
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"job-{}.csv\"", job.id),
            ),
        ],
        body,
    ))
}

async fn fetch_job(
    state: &AppState,
    headers: &HeaderMap,
    id: &str,
) -> Result<Job, (StatusCode, String)> {
    let job = state
        .jobs
        .get_job(id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, format!("no job {}", id)))?;
    if !owner_allows(&job.owner, &caller(headers)) {
        return Err((StatusCode::FORBIDDEN, "not your job".into()));
    }
    Ok(job)
}
