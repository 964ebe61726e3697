use serde::{Deserialize, Serialize};

/// A market listed on the exchange, e.g. `BTC/BRL`.
///
/// `last_price` and `change_24h` drift while a push feed is bound to the pair;
/// the 24h high/low/volume figures are static.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPair {
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub last_price: f64,
    pub change_24h: f64, // percent, 3.67 == +3.67%
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64, // in base asset units
}

impl TradingPair {
    pub fn new(base: &str, quote: &str) -> Self {
        Self {
            symbol: format!("{base}/{quote}"),
            base: base.to_string(),
            quote: quote.to_string(),
            last_price: 0.0,
            change_24h: 0.0,
            high_24h: 0.0,
            low_24h: 0.0,
            volume_24h: 0.0,
        }
    }
}
