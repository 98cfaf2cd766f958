//! Adaptive batch quote fetching.
//!
//! The fetcher coordinates one batch of symbols against the upstream
//! provider: cache first, then a timed live call, degrading to
//! synthesized fallback data per symbol. An explicit throttle signal
//! from the provider flips a batch-level flag so no further upstream
//! calls are attempted for that batch, and successful live calls are
//! paced with a small delay to respect the provider's rate ceiling.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tickerdeck_rate_limit::Clock;

use crate::cache::TtlCache;
use crate::errors::{DegradeClass, MarketDataError};
use crate::fallback::FallbackSynthesizer;
use crate::models::{Provenance, QuoteRecord};
use crate::provider::QuoteProvider;

/// Default hard bound on one upstream call.
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Default TTL for cached live quotes.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// Default courtesy delay between successive live calls.
const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(200);

/// Tuning knobs for the batch fetcher.
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Hard bound on a single upstream call; exceeding it degrades
    /// that symbol to fallback without blocking the rest of the batch.
    pub provider_timeout: Duration,
    /// How long live quotes stay servable from cache.
    pub cache_ttl: Duration,
    /// Delay inserted after a successful live call when more symbols
    /// remain. Independent of the throttle flag: it caps the outbound
    /// call rate even when the provider has not complained yet.
    pub pacing_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            pacing_delay: DEFAULT_PACING_DELAY,
        }
    }
}

/// State owned by a single `fetch_batch` invocation.
///
/// The throttle flag is monotonic: once set it stays set for the
/// remainder of the batch. Nothing here outlives the call, so
/// concurrent batches never share it.
struct BatchFetchState {
    throttled: bool,
    results: Vec<QuoteRecord>,
}

/// Per-batch quote fetch coordinator.
pub struct QuoteFetcher {
    cache: TtlCache<QuoteRecord>,
    synthesizer: FallbackSynthesizer,
    config: FetchConfig,
}

impl QuoteFetcher {
    /// Create a fetcher with the given clock and configuration.
    pub fn new(clock: Arc<dyn Clock>, config: FetchConfig) -> Self {
        Self {
            cache: TtlCache::new(clock),
            synthesizer: FallbackSynthesizer::new(),
            config,
        }
    }

    /// Create a fetcher from explicit parts (deterministic tests).
    pub fn with_parts(
        cache: TtlCache<QuoteRecord>,
        synthesizer: FallbackSynthesizer,
        config: FetchConfig,
    ) -> Self {
        Self {
            cache,
            synthesizer,
            config,
        }
    }

    /// Fetch quotes for a batch of symbols, in input order.
    ///
    /// Returns exactly one record per requested symbol. Per symbol:
    ///
    /// 1. Cache hit: emit with cached provenance, no upstream call.
    /// 2. Batch already throttled: emit fallback, no upstream call.
    /// 3. Otherwise call the provider under the configured timeout.
    ///    A throttle signal sets the sticky flag and falls back; any
    ///    other failure falls back for this symbol only; success is
    ///    cached and emitted live, then paced if symbols remain.
    ///
    /// The only error that crosses this boundary is an unconfigured
    /// integration; every other failure degrades per item.
    pub async fn fetch_batch(
        &self,
        symbols: &[String],
        provider: &dyn QuoteProvider,
    ) -> Result<Vec<QuoteRecord>, MarketDataError> {
        let mut state = BatchFetchState {
            throttled: false,
            results: Vec::with_capacity(symbols.len()),
        };

        for (index, symbol) in symbols.iter().enumerate() {
            if let Some(mut hit) = self.cache.get(symbol) {
                debug!("Cache hit for '{}'", symbol);
                hit.provenance = Provenance::Cached;
                state.results.push(hit);
                continue;
            }

            if state.throttled {
                state.results.push(self.synthesizer.synthesize(symbol));
                continue;
            }

            let outcome = tokio::time::timeout(
                self.config.provider_timeout,
                provider.fetch_quote(symbol, self.config.provider_timeout),
            )
            .await;

            match outcome {
                Err(_elapsed) => {
                    warn!(
                        "Upstream call for '{}' exceeded {:?}, using fallback",
                        symbol, self.config.provider_timeout
                    );
                    state.results.push(self.synthesizer.synthesize(symbol));
                }
                Ok(Ok(live)) => {
                    let record = QuoteRecord::from_live(symbol, &live);
                    self.cache.set(symbol, record.clone(), self.config.cache_ttl);
                    state.results.push(record);

                    // Courtesy pacing between live calls only.
                    if index + 1 < symbols.len() && !self.config.pacing_delay.is_zero() {
                        tokio::time::sleep(self.config.pacing_delay).await;
                    }
                }
                Ok(Err(error)) => match error.degrade_class() {
                    DegradeClass::Unavailable => return Err(error),
                    DegradeClass::BatchThrottle => {
                        warn!(
                            "Provider '{}' throttled on '{}', degrading rest of batch",
                            provider.id(),
                            symbol
                        );
                        state.throttled = true;
                        state.results.push(self.synthesizer.synthesize(symbol));
                    }
                    DegradeClass::SymbolOnly => {
                        debug!("Fetch failed for '{}': {}, using fallback", symbol, error);
                        state.results.push(self.synthesizer.synthesize(symbol));
                    }
                },
            }
        }

        Ok(state.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LiveQuote;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tickerdeck_rate_limit::ManualClock;

    #[derive(Clone)]
    enum Scripted {
        Live(f64),
        Throttle,
        Fail,
        Hang,
    }

    /// Provider with a per-symbol script that records every call.
    struct ScriptedProvider {
        script: HashMap<String, Scripted>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(script: &[(&str, Scripted)]) -> Self {
            Self {
                script: script
                    .iter()
                    .map(|(symbol, outcome)| (symbol.to_string(), outcome.clone()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteProvider for ScriptedProvider {
        fn id(&self) -> &'static str {
            "SCRIPTED"
        }

        async fn fetch_quote(
            &self,
            symbol: &str,
            _timeout: Duration,
        ) -> Result<LiveQuote, MarketDataError> {
            self.calls.lock().unwrap().push(symbol.to_string());
            match self.script.get(symbol) {
                Some(Scripted::Live(price)) => Ok(LiveQuote {
                    current_price: *price,
                    daily_change: 1.5,
                    daily_change_percent: 1.5 / price * 100.0,
                    high: price + 2.0,
                    low: price - 2.0,
                    open: price - 1.5,
                    previous_close: price - 1.5,
                }),
                Some(Scripted::Throttle) => Err(MarketDataError::Throttled {
                    provider: "SCRIPTED".to_string(),
                }),
                Some(Scripted::Hang) => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(MarketDataError::Timeout {
                        provider: "SCRIPTED".to_string(),
                    })
                }
                Some(Scripted::Fail) | None => Err(MarketDataError::ProviderError {
                    provider: "SCRIPTED".to_string(),
                    message: "scripted failure".to_string(),
                }),
            }
        }
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fetcher(clock: Arc<ManualClock>) -> QuoteFetcher {
        QuoteFetcher::with_parts(
            TtlCache::new(clock),
            FallbackSynthesizer::from_seed(7),
            FetchConfig {
                provider_timeout: Duration::from_millis(100),
                cache_ttl: Duration::from_secs(30),
                pacing_delay: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn test_results_preserve_input_order() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("AAPL", Scripted::Live(178.0)),
            ("ZZZZ", Scripted::Fail),
            ("MSFT", Scripted::Live(415.0)),
        ]);

        let records = fetcher
            .fetch_batch(&symbols(&["AAPL", "ZZZZ", "MSFT"]), &provider)
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].symbol, "AAPL");
        assert_eq!(records[1].symbol, "ZZZZ");
        assert_eq!(records[2].symbol, "MSFT");
        assert_eq!(records[0].provenance, Provenance::Live);
        assert_eq!(records[1].provenance, Provenance::Fallback);
        assert_eq!(records[2].provenance, Provenance::Live);
    }

    #[tokio::test]
    async fn test_throttle_is_sticky_for_the_batch() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("AAPL", Scripted::Live(178.0)),
            ("ZZZZ", Scripted::Throttle),
            ("MSFT", Scripted::Live(415.0)),
            ("NVDA", Scripted::Live(122.0)),
        ]);

        let records = fetcher
            .fetch_batch(&symbols(&["AAPL", "ZZZZ", "MSFT", "NVDA"]), &provider)
            .await
            .unwrap();

        assert_eq!(records[0].provenance, Provenance::Live);
        assert_eq!(records[1].provenance, Provenance::Fallback);
        assert_eq!(records[2].provenance, Provenance::Fallback);
        assert_eq!(records[3].provenance, Provenance::Fallback);

        // No upstream calls after the throttle signal.
        assert_eq!(provider.calls(), vec!["AAPL", "ZZZZ"]);
    }

    #[tokio::test]
    async fn test_throttle_flag_does_not_leak_across_batches() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("ZZZZ", Scripted::Throttle),
            ("MSFT", Scripted::Live(415.0)),
        ]);

        let first = fetcher
            .fetch_batch(&symbols(&["ZZZZ"]), &provider)
            .await
            .unwrap();
        assert_eq!(first[0].provenance, Provenance::Fallback);

        let second = fetcher
            .fetch_batch(&symbols(&["MSFT"]), &provider)
            .await
            .unwrap();
        assert_eq!(second[0].provenance, Provenance::Live);
    }

    #[tokio::test]
    async fn test_single_failure_does_not_throttle_batch() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("ZZZZ", Scripted::Fail),
            ("MSFT", Scripted::Live(415.0)),
        ]);

        let records = fetcher
            .fetch_batch(&symbols(&["ZZZZ", "MSFT"]), &provider)
            .await
            .unwrap();

        assert_eq!(records[0].provenance, Provenance::Fallback);
        assert_eq!(records[1].provenance, Provenance::Live);
        assert_eq!(provider.calls(), vec!["ZZZZ", "MSFT"]);
    }

    #[tokio::test]
    async fn test_slow_call_degrades_without_blocking_batch() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("SLOW", Scripted::Hang),
            ("MSFT", Scripted::Live(415.0)),
        ]);

        let records = fetcher
            .fetch_batch(&symbols(&["SLOW", "MSFT"]), &provider)
            .await
            .unwrap();

        assert_eq!(records[0].provenance, Provenance::Fallback);
        assert_eq!(records[1].provenance, Provenance::Live);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_upstream_and_retags() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[("AAPL", Scripted::Live(178.0))]);

        let first = fetcher
            .fetch_batch(&symbols(&["AAPL"]), &provider)
            .await
            .unwrap();
        assert_eq!(first[0].provenance, Provenance::Live);

        let second = fetcher
            .fetch_batch(&symbols(&["AAPL"]), &provider)
            .await
            .unwrap();
        assert_eq!(second[0].provenance, Provenance::Cached);
        assert_eq!(second[0].price, 178.0);

        // Only the first batch reached the provider.
        assert_eq!(provider.calls(), vec!["AAPL"]);
    }

    #[tokio::test]
    async fn test_cache_expiry_triggers_fresh_fetch() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock.clone());
        let provider = ScriptedProvider::new(&[("AAPL", Scripted::Live(178.0))]);

        fetcher
            .fetch_batch(&symbols(&["AAPL"]), &provider)
            .await
            .unwrap();
        clock.advance(Duration::from_secs(31));
        fetcher
            .fetch_batch(&symbols(&["AAPL"]), &provider)
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec!["AAPL", "AAPL"]);
    }

    #[tokio::test]
    async fn test_live_quote_followed_by_throttle() {
        // Valid quote for AAPL, 429 for ZZZZ, then a cached re-read
        // of AAPL within the TTL.
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[
            ("AAPL", Scripted::Live(178.0)),
            ("ZZZZ", Scripted::Throttle),
        ]);

        let records = fetcher
            .fetch_batch(&symbols(&["AAPL", "ZZZZ"]), &provider)
            .await
            .unwrap();
        assert_eq!(records[0].symbol, "AAPL");
        assert_eq!(records[0].provenance, Provenance::Live);
        assert_eq!(records[1].symbol, "ZZZZ");
        assert_eq!(records[1].provenance, Provenance::Fallback);

        let cached = fetcher
            .fetch_batch(&symbols(&["AAPL"]), &provider)
            .await
            .unwrap();
        assert_eq!(cached[0].provenance, Provenance::Cached);
        assert_eq!(provider.calls(), vec!["AAPL", "ZZZZ"]);
    }

    #[tokio::test]
    async fn test_missing_credential_is_surfaced_not_degraded() {
        struct Unconfigured;

        #[async_trait]
        impl QuoteProvider for Unconfigured {
            fn id(&self) -> &'static str {
                "UNCONFIGURED"
            }

            async fn fetch_quote(
                &self,
                _symbol: &str,
                _timeout: Duration,
            ) -> Result<LiveQuote, MarketDataError> {
                Err(MarketDataError::MissingCredential)
            }
        }

        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let result = fetcher
            .fetch_batch(&symbols(&["AAPL"]), &Unconfigured)
            .await;

        assert!(matches!(result, Err(MarketDataError::MissingCredential)));
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty() {
        let clock = ManualClock::new(Utc::now());
        let fetcher = fetcher(clock);
        let provider = ScriptedProvider::new(&[]);

        let records = fetcher.fetch_batch(&[], &provider).await.unwrap();
        assert!(records.is_empty());
        assert!(provider.calls().is_empty());
    }
}
