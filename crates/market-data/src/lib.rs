//! Resilient market data access for tickerdeck.
//!
//! This crate wraps an external quote provider with the machinery
//! needed to keep a dashboard responsive when that provider is slow,
//! throttling, or misconfigured: a TTL cache over live quotes, a
//! synthesizer for placeholder data, and a batch fetch orchestrator
//! that degrades per symbol instead of failing the request.
//!
//! The main entry point is [`QuoteFetcher::fetch_batch`], which takes
//! a list of symbols and any [`QuoteProvider`] implementation and
//! returns one [`QuoteRecord`] per symbol, each tagged with its
//! [`Provenance`].

pub mod cache;
pub mod errors;
pub mod fallback;
pub mod fetch;
pub mod models;
pub mod provider;

pub use cache::TtlCache;
pub use errors::{DegradeClass, MarketDataError};
pub use fallback::FallbackSynthesizer;
pub use fetch::{FetchConfig, QuoteFetcher};
pub use models::{LiveQuote, Provenance, QuoteRecord};
pub use provider::{FinnhubProvider, QuoteProvider};
