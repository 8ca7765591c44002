//! `/api/v1/queues` routes.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::state::AppState;
use crate::queue::{registry, QueueCreate, QueueInfo, QueueList};

pub async fn list_queues(State(state): State<AppState>) -> Result<Json<QueueList>, ApiError> {
    let mut redis = state.redis.clone();
    let queues = registry::list(&mut redis).await?;
    Ok(Json(QueueList { queues }))
}

pub async fn create_queue(
    State(state): State<AppState>,
    Json(body): Json<QueueCreate>,
) -> Result<Json<QueueInfo>, ApiError> {
    let mut redis = state.redis.clone();
    let info = registry::create(&mut redis, body).await?;
    Ok(Json(info))
}

pub async fn get_queue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<QueueInfo>, ApiError> {
    let mut redis = state.redis.clone();
    let info = registry::info(&mut redis, &name).await?;
    Ok(Json(info))
}

pub async fn delete_queue(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut redis = state.redis.clone();
    registry::delete(&mut redis, &name).await?;
    Ok(Json(json!({ "status": "deleted", "queue": name })))
}
