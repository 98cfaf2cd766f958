//! Upstream quote providers.

pub mod finnhub;
mod traits;

pub use finnhub::FinnhubProvider;
pub use traits::QuoteProvider;
