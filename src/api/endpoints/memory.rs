//! Read-only store inspection.
//!
//! `GET /memory/{metadata,fields,conversations}`: full scans, oldest
//! first.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{ConversationRecord, FieldsRecord, MetadataRecord};

pub async fn metadata(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<MetadataRecord>>, ApiError> {
    let core = ctx.core.clone();
    let rows = tokio::task::spawn_blocking(move || core.store().metadata()).await??;
    Ok(Json(rows))
}

pub async fn fields(State(ctx): State<ApiContext>) -> Result<Json<Vec<FieldsRecord>>, ApiError> {
    let core = ctx.core.clone();
    let rows = tokio::task::spawn_blocking(move || core.store().fields()).await??;
    Ok(Json(rows))
}

pub async fn conversations(
    State(ctx): State<ApiContext>,
) -> Result<Json<Vec<ConversationRecord>>, ApiError> {
    let core = ctx.core.clone();
    let rows = tokio::task::spawn_blocking(move || core.store().conversations()).await??;
    Ok(Json(rows))
}
