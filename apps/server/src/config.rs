use std::time::Duration;

/// Server configuration resolved from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: String,
    /// Finnhub API key. When absent the quote endpoints answer 503
    /// instead of silently serving fallback data.
    pub finnhub_api_key: Option<String>,
    pub provider_timeout: Duration,
    pub quote_cache_ttl: Duration,
    pub provider_pacing: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        // Load .env if present; real env vars take precedence.
        let _ = dotenvy::dotenv();

        let listen_addr =
            std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8484".to_string());

        let finnhub_api_key = std::env::var("FINNHUB_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let provider_timeout = Duration::from_secs(env_u64("PROVIDER_TIMEOUT_SECS", 5));
        let quote_cache_ttl = Duration::from_secs(env_u64("QUOTE_CACHE_TTL_SECS", 30));
        let provider_pacing = Duration::from_millis(env_u64("PROVIDER_PACING_MS", 200));

        Self {
            listen_addr,
            finnhub_api_key,
            provider_timeout,
            quote_cache_ttl,
            provider_pacing,
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
