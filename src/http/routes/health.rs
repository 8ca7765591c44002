//! `GET /api/health`.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::http::state::AppState;
use crate::redis_client;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let mut redis = state.redis.clone();
    match redis_client::ping(&mut redis).await {
        Ok(()) => Json(json!({ "status": "ok" })),
        Err(e) => Json(json!({ "status": "error", "detail": e.to_string() })),
    }
}
