//! Upstream quote provider trait definition.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::LiveQuote;

/// Trait for upstream quote providers.
///
/// Implement this trait to add support for a new quote source. The
/// batch fetch orchestrator only needs a single-symbol fetch with a
/// bounded timeout; throttling, degradation, and caching live outside
/// the provider.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use tickerdeck_market_data::{LiveQuote, MarketDataError, QuoteProvider};
///
/// struct MyProvider;
///
/// #[async_trait]
/// impl QuoteProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     async fn fetch_quote(
///         &self,
///         symbol: &str,
///         timeout: Duration,
///     ) -> Result<LiveQuote, MarketDataError> {
///         // ... call the upstream API
///         # unimplemented!()
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "FINNHUB". Used for logging
    /// and error attribution.
    fn id(&self) -> &'static str;

    /// Fetch the latest quote for one symbol.
    ///
    /// `timeout` is a hard bound on the call; an implementation that
    /// exceeds it must fail with [`MarketDataError::Timeout`] rather
    /// than block. An explicit upstream rate-limit response maps to
    /// [`MarketDataError::Throttled`]; a payload whose price is zero
    /// or absent maps to [`MarketDataError::InvalidQuote`].
    async fn fetch_quote(
        &self,
        symbol: &str,
        timeout: Duration,
    ) -> Result<LiveQuote, MarketDataError>;
}
