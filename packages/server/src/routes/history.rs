//! Retrieval endpoints over the audit store.

use audit::AuditRecord;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;

const MAX_PAGE: usize = 100;

fn require_user(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "missing X-User-Id header"))
}

/// Fetch one audit record by id.
pub async fn get_audit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<AuditRecord>, ApiError> {
    let user_id = require_user(&headers)?;

    let record = state
        .store
        .get(&id)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .filter(|r| r.user_id == user_id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "audit not found"))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    skip: usize,
}

fn default_limit() -> usize {
    20
}

/// List the caller's audit history, most recent first.
pub async fn history_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<AuditRecord>>, ApiError> {
    let user_id = require_user(&headers)?;
    let limit = query.limit.min(MAX_PAGE);

    let records = state
        .store
        .list(&user_id, limit, query.skip)
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(records))
}
