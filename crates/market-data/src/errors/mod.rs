//! Error types and degradation classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`DegradeClass`]: Classification for determining degradation behavior

mod degrade;

pub use degrade::DegradeClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`DegradeClass`] via the
/// [`degrade_class`](Self::degrade_class) method, which determines how
/// the batch fetch orchestrator handles the error.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The upstream credential is missing or rejected.
    /// Fatal for the call path - surfaced as unavailable, never
    /// silently replaced with fallback data.
    #[error("Upstream market data credential is not configured")]
    MissingCredential,

    /// The provider rate limited the request (HTTP 429-class).
    /// Degrade to fallback for the remainder of the batch.
    #[error("Throttled by provider: {provider}")]
    Throttled {
        /// The provider that throttled the request
        provider: String,
    },

    /// The request to the provider timed out.
    /// Degrade to fallback for this symbol only.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider returned a payload with a missing, zero, or
    /// malformed price. A zero quote is invalid data, not a
    /// legitimate zero price.
    #[error("Invalid quote for {symbol}: {message}")]
    InvalidQuote {
        /// The symbol whose payload was invalid
        symbol: String,
        /// Description of what was wrong with the payload
        message: String,
    },

    /// A provider-specific error occurred (unexpected HTTP status,
    /// unparseable body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the degradation classification for this error.
    ///
    /// - [`DegradeClass::BatchThrottle`]: stop calling upstream for the batch
    /// - [`DegradeClass::SymbolOnly`]: fall back for this symbol only
    /// - [`DegradeClass::Unavailable`]: surface to the caller, never degrade
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerdeck_market_data::errors::{DegradeClass, MarketDataError};
    ///
    /// let error = MarketDataError::Throttled { provider: "FINNHUB".to_string() };
    /// assert_eq!(error.degrade_class(), DegradeClass::BatchThrottle);
    ///
    /// let error = MarketDataError::Timeout { provider: "FINNHUB".to_string() };
    /// assert_eq!(error.degrade_class(), DegradeClass::SymbolOnly);
    /// ```
    pub fn degrade_class(&self) -> DegradeClass {
        match self {
            // Explicit throttle signal - sticky for the batch
            Self::Throttled { .. } => DegradeClass::BatchThrottle,

            // Per-symbol transient failures
            Self::Timeout { .. }
            | Self::InvalidQuote { .. }
            | Self::ProviderError { .. }
            | Self::Network(_) => DegradeClass::SymbolOnly,

            // Unconfigured integration - fatal for the call path
            Self::MissingCredential => DegradeClass::Unavailable,
        }
    }
}
