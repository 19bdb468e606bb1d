//! Request handlers for the HTTP surface.

use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::AppState;
use super::error::ApiError;
use crate::error::Error;
use crate::llm::Completer;
use crate::model::{Item, ItemId};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub processed: usize,
    pub results: Vec<Item>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

/// `POST /api/generate-essays`: run a batch and answer once it finishes.
pub async fn generate_essays<C: Completer + 'static>(
    State(state): State<AppState<C>>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        ApiError::BadRequest(format!("invalid request body: {}", rejection.body_text()))
    })?;
    let topics = request.topics.unwrap_or_default();
    info!(topics = topics.len(), "batch submitted");

    // Detached so a dropped connection cannot cancel the batch mid-way.
    let processor = Arc::clone(&state.processor);
    let results = tokio::spawn(async move { processor.run(topics).await })
        .await
        .map_err(|e| ApiError::Internal(Error::Other(format!("batch task failed: {e}"))))??;
    Ok(Json(GenerateResponse {
        success: true,
        processed: results.len(),
        results,
    }))
}

/// `GET /api/essays?search=`: stored items, newest first.
pub async fn list_essays<C: Completer + 'static>(
    State(state): State<AppState<C>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Item>>, ApiError> {
    let items = state.store.list(query.search.as_deref()).await?;
    Ok(Json(items))
}

/// `DELETE /api/essays/{id}`: idempotent; unknown ids also succeed.
pub async fn delete_essay<C: Completer + 'static>(
    State(state): State<AppState<C>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id.map_err(|rejection| {
        ApiError::BadRequest(format!("invalid essay id: {}", rejection.body_text()))
    })?;

    let removed = state.store.delete(ItemId(id)).await?;
    if !removed {
        warn!(id, "delete requested for unknown id");
    }
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/progress`: live progress events as server-sent events.
///
/// The stream starts with a `connected` event and carries only events
/// broadcast after it opened. Dropping the connection unsubscribes.
pub async fn progress<C: Completer + 'static>(
    State(state): State<AppState<C>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.broadcaster.subscribe();
    debug!(subscriber = %subscription.id(), "progress stream opened");

    let stream = subscription.filter_map(|event| async move {
        match Event::default().json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                warn!(kind = event.kind(), error = %e, "failed to encode progress event");
                None
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// `GET /api/health`
pub async fn health<C: Completer + 'static>(State(state): State<AppState<C>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "subscribers": state.broadcaster.subscriber_count(),
    }))
}
