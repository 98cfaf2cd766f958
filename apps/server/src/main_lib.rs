use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use tickerdeck_market_data::{FetchConfig, FinnhubProvider, QuoteFetcher, QuoteProvider};
use tickerdeck_rate_limit::{Clock, RateLimitGate, SystemClock, WindowConfig};

pub struct AppState {
    pub gate: RateLimitGate,
    pub fetcher: QuoteFetcher,
    /// None when no API key is configured; quote requests then answer
    /// 503 rather than degrading to fallback data.
    pub provider: Option<Arc<dyn QuoteProvider>>,
}

pub fn init_tracing() {
    let log_format = std::env::var("TD_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> Arc<AppState> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let gate = RateLimitGate::new(clock.clone(), WindowConfig::default());

    let fetcher = QuoteFetcher::new(
        clock,
        FetchConfig {
            provider_timeout: config.provider_timeout,
            cache_ttl: config.quote_cache_ttl,
            pacing_delay: config.provider_pacing,
        },
    );

    let provider: Option<Arc<dyn QuoteProvider>> = match &config.finnhub_api_key {
        Some(key) => Some(Arc::new(FinnhubProvider::new(key.clone()))),
        None => {
            tracing::warn!("FINNHUB_API_KEY not set, quote endpoints will answer 503");
            None
        }
    };

    Arc::new(AppState {
        gate,
        fetcher,
        provider,
    })
}
