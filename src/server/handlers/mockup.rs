//! Single-mockup preview handler.
//!
//! Mirrors the one-off generation flow: given a company name and a
//! template, render one image and return it base64-encoded for an inline
//! preview, together with the shortened name.

use axum::{extract::State, http::StatusCode, Json};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::job::Mapping;
use crate::naming::shorten_company_name;
use crate::render::{encode_jpeg, COMPANY_NAME_VARIABLE};
use crate::rows::{Row, RowSet};

use super::super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub template_id: String,
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub preview_base64: String,
    pub shortened_name: String,
}

/// Handle POST /api/mockup/preview — render one row synchronously.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, (StatusCode, String)> {
    let template = state
        .templates
        .get_template(&req.template_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("no template {}", req.template_id),
        ))?;

    // One synthetic row whose company column is mapped for every variable
    // that wants the company name.
    let mut rows = RowSet::new(vec![COMPANY_NAME_VARIABLE.to_string()]);
    rows.rows.push(Row {
        cells: vec![req.company_name.clone()],
    });
    let mapping = Mapping::from([(
        COMPANY_NAME_VARIABLE.to_string(),
        COMPANY_NAME_VARIABLE.to_string(),
    )]);

    let prepared = state
        .runner
        .renderer
        .prepare(&template, &rows, 0, &mapping, &state.runner.resolver)
        .await
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    let renderer = state.runner.renderer.clone();
    let encoded = tokio::task::spawn_blocking(move || {
        let img = renderer.render(&template, prepared)?;
        encode_jpeg(&img)
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("render task failed: {}", e)))?
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(PreviewResponse {
        preview_base64: base64::engine::general_purpose::STANDARD.encode(encoded),
        shortened_name: shorten_company_name(&req.company_name),
    }))
}
