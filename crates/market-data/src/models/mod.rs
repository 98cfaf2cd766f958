//! Data models for quotes and their provenance.

mod quote;

pub use quote::{LiveQuote, Provenance, QuoteRecord};
