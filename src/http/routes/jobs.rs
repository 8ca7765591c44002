//! `/api/v1/queues/{name}/jobs` routes.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::http::state::AppState;
use crate::job::model::{
    JobClaim, JobComplete, JobFail, JobListQuery, JobListResponse, SubmitBody, SubmitResponse,
};
use crate::job::{claim, complete, listing, submit};

pub async fn submit_jobs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let mut redis = state.redis.clone();
    let response = submit::submit(&mut redis, &name, body.into_jobs()).await?;
    Ok(Json(response))
}

pub async fn claim_jobs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<JobClaim>,
) -> Result<Json<Value>, ApiError> {
    let mut redis = state.redis.clone();
    let jobs = claim::claim(&mut redis, &name, body).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

pub async fn complete_job(
    State(state): State<AppState>,
    Path((name, job_id)): Path<(String, String)>,
    Json(body): Json<JobComplete>,
) -> Result<Json<Value>, ApiError> {
    let mut redis = state.redis.clone();
    complete::complete(&mut redis, &name, &job_id, body.result, state.config.job_meta_ttl_secs).await?;
    Ok(Json(json!({ "status": "completed", "job_id": job_id })))
}

pub async fn fail_job(
    State(state): State<AppState>,
    Path((name, job_id)): Path<(String, String)>,
    Json(body): Json<JobFail>,
) -> Result<Json<Value>, ApiError> {
    let mut redis = state.redis.clone();
    let retries = complete::fail(
        &mut redis,
        &name,
        &job_id,
        &body.error,
        state.config.job_meta_ttl_secs,
    )
    .await?;
    Ok(Json(json!({ "status": "failed", "job_id": job_id, "retries": retries })))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, ApiError> {
    let mut redis = state.redis.clone();
    let response = listing::list_jobs(
        &mut redis,
        &name,
        query.status.as_deref(),
        query.count,
        query.cursor.as_deref(),
    )
    .await?;
    Ok(Json(response))
}
