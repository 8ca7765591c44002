//! Error types shared across the queue control plane.
//!
//! Every subsystem defines its own error enum with `thiserror`, following the
//! one-enum-per-subsystem convention; [`ApiError`] classifies all of them into
//! the handful of kinds the HTTP boundary actually distinguishes (see the
//! error table in the design notes) and renders them as JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors raised by the queue registry (create/delete/list/info).
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue '{0}' already exists")]
    Conflict(String),

    #[error("queue '{0}' not found")]
    NotFound(String),

    #[error("invalid queue name '{0}': must match ^[a-z0-9][a-z0-9._-]{{0,127}}$")]
    InvalidName(String),

    #[error("datastore error: {0}")]
    Datastore(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by submit/claim/complete/fail/list operations on jobs.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("queue '{0}' not found")]
    QueueNotFound(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("datastore error: {0}")]
    Datastore(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<QueueError> for JobError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotFound(name) => JobError::QueueNotFound(name),
            QueueError::Conflict(name) => JobError::QueueNotFound(name),
            QueueError::InvalidName(name) => JobError::Validation(name),
            QueueError::Datastore(e) => JobError::Datastore(e),
            QueueError::Serialization(e) => JobError::Serialization(e),
        }
    }
}

/// The small set of error kinds the HTTP boundary distinguishes.
///
/// Everything raised by the registry, submission, claim, completion, and
/// listing components funnels through here before it reaches a response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("auth failed: {0}")]
    Auth(&'static str),

    #[error("datastore unavailable: {0}")]
    DatastoreUnavailable(String),
}

impl From<QueueError> for ApiError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::NotFound(name) => ApiError::NotFound(format!("queue '{name}'")),
            QueueError::Conflict(name) => ApiError::Conflict(format!("queue '{name}'")),
            QueueError::InvalidName(name) => ApiError::Validation(name),
            QueueError::Datastore(e) => ApiError::DatastoreUnavailable(e.to_string()),
            QueueError::Serialization(e) => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::QueueNotFound(name) => ApiError::NotFound(format!("queue '{name}'")),
            JobError::JobNotFound(id) => ApiError::NotFound(format!("job '{id}'")),
            JobError::Validation(msg) => ApiError::Validation(msg),
            JobError::Datastore(e) => ApiError::DatastoreUnavailable(e.to_string()),
            JobError::Serialization(e) => ApiError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            ApiError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::DatastoreUnavailable(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_not_found_maps_to_404() {
        let err: ApiError = QueueError::NotFound("q1".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn queue_conflict_maps_to_409() {
        let err: ApiError = QueueError::Conflict("q1".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn job_not_found_maps_to_404() {
        let err: ApiError = JobError::JobNotFound("1-0".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
