//! Finnhub quote provider implementation.
//!
//! Fetches real-time quotes from the Finnhub /quote endpoint.
//! Finnhub free tier is limited to 60 API calls per minute; a 429 (or
//! a 403 quota rejection) from the API maps to a throttle signal so
//! the orchestrator can stop hammering it.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::LiveQuote;
use crate::provider::QuoteProvider;

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

/// Response from /quote endpoint.
///
/// Finnhub returns all-zero payloads for unknown symbols instead of
/// an error, so every field is optional here and validated in
/// [`into_live_quote`].
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change since previous close
    d: Option<f64>,
    /// Percent change since previous close
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
}

/// Finnhub quote provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }
}

#[async_trait]
impl QuoteProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_quote(
        &self,
        symbol: &str,
        timeout: Duration,
    ) -> Result<LiveQuote, MarketDataError> {
        let url = format!("{}/quote", BASE_URL);

        debug!("Finnhub request: /quote for '{}'", symbol);

        let response = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(&[("symbol", symbol)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        let status = response.status();

        // Explicit rate limiting, or quota exceeded on the API key.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MarketDataError::Throttled {
                provider: PROVIDER_ID.to_string(),
            });
        }

        // Invalid API key: the integration is misconfigured, which is
        // not a condition fallback data may paper over.
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::MissingCredential);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to read response: {}", e),
            })?;

        let parsed: QuoteResponse =
            serde_json::from_str(&text).map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to parse quote response: {}", e),
            })?;

        into_live_quote(symbol, parsed)
    }
}

/// Validate a raw payload into a complete [`LiveQuote`].
///
/// A missing or zero current price marks the whole payload invalid
/// (Finnhub returns zeros for unknown symbols), and any other absent
/// field does too: a live record is complete or it is nothing.
fn into_live_quote(symbol: &str, response: QuoteResponse) -> Result<LiveQuote, MarketDataError> {
    let invalid = |message: &str| MarketDataError::InvalidQuote {
        symbol: symbol.to_string(),
        message: message.to_string(),
    };

    let current_price = response.c.ok_or_else(|| invalid("price is missing"))?;
    if current_price == 0.0 {
        return Err(invalid("price is zero"));
    }

    Ok(LiveQuote {
        current_price,
        daily_change: response.d.ok_or_else(|| invalid("change is missing"))?,
        daily_change_percent: response
            .dp
            .ok_or_else(|| invalid("change percent is missing"))?,
        high: response.h.ok_or_else(|| invalid("high is missing"))?,
        low: response.l.ok_or_else(|| invalid("low is missing"))?,
        open: response.o.ok_or_else(|| invalid("open is missing"))?,
        previous_close: response
            .pc
            .ok_or_else(|| invalid("previous close is missing"))?,
    })
}
