use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tickerdeck_market_data::QuoteRecord;

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

/// Upper bound on symbols per request.
const MAX_BATCH_SYMBOLS: usize = 200;

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuotesRequest {
    symbols: Vec<String>,
}

/// Fetch quotes for a batch of symbols, in request order.
///
/// Answers 503 when no provider credential is configured; every other
/// upstream problem degrades per symbol inside the fetcher and still
/// yields a complete response.
async fn fetch_quotes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QuotesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<QuoteRecord>>> {
    let Json(body) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    if body.symbols.len() > MAX_BATCH_SYMBOLS {
        return Err(ApiError::BadRequest(format!(
            "too many symbols: {} (max {})",
            body.symbols.len(),
            MAX_BATCH_SYMBOLS
        )));
    }

    let provider = state.provider.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("market data provider is not configured".to_string())
    })?;

    let quotes = state
        .fetcher
        .fetch_batch(&body.symbols, provider.as_ref())
        .await?;
    Ok(Json(quotes))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/quotes", post(fetch_quotes))
}
