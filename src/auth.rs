//! The `X-API-Key` auth gate.
//!
//! Wrapped around mutating routes only, via `axum::middleware::from_fn_with_state`.
//! Read-only routes are never wrapped, so they work identically whether or not
//! any keys are configured.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::http::state::AppState;

const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests missing or mismatching a configured API key.
///
/// If no keys are configured, every request passes untouched.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let keys: &[String] = state.config.api_keys.as_ref();
    if keys.is_empty() {
        return Ok(next.run(req).await);
    }

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        None => Err(ApiError::Auth("Missing")),
        Some(candidate) if keys.iter().any(|key| constant_time_eq(key.as_bytes(), candidate.as_bytes())) => {
            Ok(next.run(req).await)
        }
        Some(_) => Err(ApiError::Auth("Invalid")),
    }
}

/// Compares two byte slices in time independent of where they first differ.
///
/// Length is allowed to leak (it is a property of the configured keys, not a
/// secret derived from the comparison), but byte-level mismatch position is not.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_slices_compare_equal() {
        assert!(constant_time_eq(b"secret-key", b"secret-key"));
    }

    #[test]
    fn differing_slices_compare_unequal() {
        assert!(!constant_time_eq(b"secret-key", b"secret-kex"));
    }

    #[test]
    fn differing_lengths_compare_unequal() {
        assert!(!constant_time_eq(b"short", b"much-longer"));
    }
}
