//! Template CRUD handlers.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;

use crate::template::Template;

use super::super::state::AppState;
use super::{caller, owner_allows};

/// Handle POST /api/templates — store a template definition.
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(mut template): Json<Template>,
) -> Result<Json<Template>, (StatusCode, String)> {
    template
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    template.owner = caller(&headers);
    state
        .templates
        .put_template(template.clone())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(template))
}

/// Handle GET /api/templates — list templates visible to the caller.
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Template>>, (StatusCode, String)> {
    let who = caller(&headers);
    let all = state
        .templates
        .list_templates()
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(
        all.into_iter()
            .filter(|t| owner_allows(&t.owner, &who))
            .collect(),
    ))
}

/// Handle GET /api/templates/:id
pub async fn get(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Template>, (StatusCode, String)> {
    let template = state
        .templates
        .get_template(&id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, format!("no template {}", id)))?;
    if !owner_allows(&template.owner, &caller(&headers)) {
        return Err((StatusCode::FORBIDDEN, "not your template".into()));
    }
    Ok(Json(template))
}
