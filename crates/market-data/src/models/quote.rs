use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a returned quote came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Fetched from the upstream provider during this request.
    Live,
    /// Served from the short-TTL cache.
    Cached,
    /// Synthesized placeholder data.
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Cached => write!(f, "cached"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Payload shape returned by the upstream quote provider.
///
/// All fields are required; a payload that cannot fill every field is
/// rejected as invalid rather than producing a partial record.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LiveQuote {
    /// Current price
    pub current_price: f64,
    /// Absolute change since previous close
    pub daily_change: f64,
    /// Percent change since previous close
    pub daily_change_percent: f64,
    /// High price of the day
    pub high: f64,
    /// Low price of the day
    pub low: f64,
    /// Open price of the day
    pub open: f64,
    /// Previous close price
    pub previous_close: f64,
}

/// Quote returned for one requested symbol.
///
/// Produced one-to-one with the requested symbols and never partial:
/// a symbol whose upstream payload is absent or malformed gets a
/// fallback record instead of a half-filled live one.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Requested symbol, as given
    pub symbol: String,
    /// Current price
    pub price: f64,
    /// Absolute change since previous close
    pub change: f64,
    /// Percent change since previous close
    pub change_percent: f64,
    /// High price of the day
    pub high: f64,
    /// Low price of the day
    pub low: f64,
    /// Open price of the day
    pub open: f64,
    /// Previous close price
    pub previous_close: f64,
    /// Where this record came from
    pub provenance: Provenance,
}

impl QuoteRecord {
    /// Build a live record from an upstream payload.
    pub fn from_live(symbol: &str, live: &LiveQuote) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: live.current_price,
            change: live.daily_change,
            change_percent: live.daily_change_percent,
            high: live.high,
            low: live.low,
            open: live.open,
            previous_close: live.previous_close,
            provenance: Provenance::Live,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_live_maps_all_fields() {
        let live = LiveQuote {
            current_price: 150.25,
            daily_change: 1.50,
            daily_change_percent: 1.01,
            high: 152.0,
            low: 148.5,
            open: 149.0,
            previous_close: 148.75,
        };
        let record = QuoteRecord::from_live("AAPL", &live);

        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.price, 150.25);
        assert_eq!(record.change, 1.50);
        assert_eq!(record.high, 152.0);
        assert_eq!(record.low, 148.5);
        assert_eq!(record.open, 149.0);
        assert_eq!(record.previous_close, 148.75);
        assert_eq!(record.provenance, Provenance::Live);
    }

    #[test]
    fn test_provenance_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Provenance::Live).unwrap(),
            "\"live\""
        );
        assert_eq!(
            serde_json::to_string(&Provenance::Fallback).unwrap(),
            "\"fallback\""
        );
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = QuoteRecord::from_live("AAPL", &LiveQuote::default());
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"changePercent\""));
        assert!(json.contains("\"previousClose\""));
        assert!(json.contains("\"provenance\":\"live\""));
    }
}
