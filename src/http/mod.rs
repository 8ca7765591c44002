//! HTTP surface: router assembly, shared state, and request/response wiring.

pub mod routes;
pub mod state;

use axum::http::header::{CONTENT_TYPE, HeaderName};
use axum::http::Method;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;
use state::AppState;

/// Builds the full router: public routes, auth-gated mutating routes, then
/// the CORS/tracing layers that wrap everything.
pub fn build_router(state: AppState) -> Router {
    let api_key_header = HeaderName::from_static("x-api-key");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, api_key_header]);

    let public = Router::new()
        .route("/api/health", get(routes::health::health))
        .route("/api/v1/queues", get(routes::queues::list_queues))
        .route("/api/v1/queues/:name", get(routes::queues::get_queue))
        .route(
            "/api/v1/queues/:name/jobs",
            get(routes::jobs::list_jobs),
        );

    let protected = Router::new()
        .route("/api/v1/queues", post(routes::queues::create_queue))
        .route("/api/v1/queues/:name", delete(routes::queues::delete_queue))
        .route("/api/v1/queues/:name/jobs", post(routes::jobs::submit_jobs))
        .route(
            "/api/v1/queues/:name/jobs/claim",
            post(routes::jobs::claim_jobs),
        )
        .route(
            "/api/v1/queues/:name/jobs/:job_id/complete",
            put(routes::jobs::complete_job),
        )
        .route(
            "/api/v1/queues/:name/jobs/:job_id/fail",
            put(routes::jobs::fail_job),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key,
        ));

    public
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
