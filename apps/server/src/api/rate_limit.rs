use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tickerdeck_rate_limit::{project_status, GateStatus, WindowCheck, WindowConfig};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitRequest {
    identifier: String,
    max_attempts: Option<u32>,
    window_ms: Option<u64>,
    lockout_ms: Option<u64>,
}

impl RateLimitRequest {
    /// Per-request limits layered over the defaults.
    fn window_config(&self) -> WindowConfig {
        let defaults = WindowConfig::default();
        WindowConfig {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            window: self
                .window_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.window),
            lockout: self
                .lockout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.lockout),
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitResponse {
    allowed: bool,
    remaining_attempts: u32,
    lockout_time_remaining_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl From<&WindowCheck> for RateLimitResponse {
    fn from(check: &WindowCheck) -> Self {
        let status = project_status(check);
        let message = match status {
            GateStatus::Ok => None,
            other => Some(other.to_string()),
        };
        Self {
            allowed: check.allowed,
            remaining_attempts: check.remaining_attempts,
            lockout_time_remaining_minutes: check.lockout_remaining_minutes,
            message,
        }
    }
}

fn parse_request(
    payload: Result<Json<RateLimitRequest>, JsonRejection>,
) -> Result<RateLimitRequest, ApiError> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    if body.identifier.trim().is_empty() {
        return Err(ApiError::BadRequest("identifier must not be empty".to_string()));
    }
    Ok(body)
}

/// Check whether an identifier may proceed. Denied checks answer 429
/// with the same body shape so clients read one schema.
async fn check(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RateLimitRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let body = parse_request(payload)?;
    let result = state.gate.check_with(&body.identifier, &body.window_config());
    let response = RateLimitResponse::from(&result);

    if result.allowed {
        Ok(Json(response).into_response())
    } else {
        Ok((StatusCode::TOO_MANY_REQUESTS, Json(response)).into_response())
    }
}

/// Record a failed attempt and report the updated standing.
async fn record_failure(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RateLimitRequest>, JsonRejection>,
) -> ApiResult<Json<RateLimitResponse>> {
    let body = parse_request(payload)?;
    let config = body.window_config();
    state.gate.record_failure_with(&body.identifier, &config);
    let result = state.gate.check_with(&body.identifier, &config);
    Ok(Json(RateLimitResponse::from(&result)))
}

/// Drop all state for an identifier (successful completion).
async fn clear(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RateLimitRequest>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let body = parse_request(payload)?;
    state.gate.clear(&body.identifier);
    Ok(Json(serde_json::json!({ "cleared": true })))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rate-limit/check", post(check))
        .route("/rate-limit/failure", post(record_failure))
        .route("/rate-limit/clear", post(clear))
}
