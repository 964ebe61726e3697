use crate::domain::TradingPair;

/// Base price used when an order book or trade tape is requested for a
/// symbol that is not listed.
pub const DEFAULT_BASE_PRICE: f64 = 488_334.0;

/// The static set of listed trading pairs.
#[derive(Debug, Clone)]
pub struct PairRegistry {
    pairs: Vec<TradingPair>,
}

impl PairRegistry {
    pub fn new(pairs: Vec<TradingPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[TradingPair] {
        &self.pairs
    }

    pub fn find(&self, symbol: &str) -> Option<&TradingPair> {
        self.pairs.iter().find(|p| p.symbol == symbol)
    }

    /// Last price of `symbol`, or [`DEFAULT_BASE_PRICE`] when it is not listed.
    pub fn base_price(&self, symbol: &str) -> f64 {
        self.find(symbol)
            .map(|p| p.last_price)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }

    /// The pair for `symbol`, falling back to the first listed pair.
    /// Returns `None` only for an empty registry.
    pub fn resolve(&self, symbol: &str) -> Option<TradingPair> {
        self.find(symbol).or_else(|| self.pairs.first()).cloned()
    }
}

impl Default for PairRegistry {
    fn default() -> Self {
        Self::new(vec![
            TradingPair {
                last_price: 488_334.00,
                change_24h: 3.67,
                high_24h: 491_047.00,
                low_24h: 464_800.00,
                volume_24h: 28.521_030_93,
                ..TradingPair::new("BTC", "BRL")
            },
            TradingPair {
                last_price: 18_234.50,
                change_24h: 2.34,
                high_24h: 18_500.00,
                low_24h: 17_800.00,
                volume_24h: 156.78,
                ..TradingPair::new("ETH", "BRL")
            },
            TradingPair {
                last_price: 5.12,
                change_24h: 0.15,
                high_24h: 5.15,
                low_24h: 5.08,
                volume_24h: 125_000.00,
                ..TradingPair::new("USDT", "BRL")
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_lists_brl_pairs() {
        let registry = PairRegistry::default();
        let symbols: Vec<&str> = registry.pairs().iter().map(|p| p.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC/BRL", "ETH/BRL", "USDT/BRL"]);

        let eth = registry.find("ETH/BRL").expect("ETH/BRL listed");
        assert_eq!(eth.base, "ETH");
        assert_eq!(eth.quote, "BRL");
    }

    #[test]
    fn test_base_price_falls_back_for_unknown_symbol() {
        let registry = PairRegistry::default();
        assert_eq!(registry.base_price("USDT/BRL"), 5.12);
        assert_eq!(registry.base_price("DOGE/BRL"), DEFAULT_BASE_PRICE);
    }

    #[test]
    fn test_resolve_falls_back_to_first_pair() {
        let registry = PairRegistry::default();
        assert_eq!(registry.resolve("ETH/BRL").map(|p| p.symbol), Some("ETH/BRL".into()));
        assert_eq!(registry.resolve("nope").map(|p| p.symbol), Some("BTC/BRL".into()));
        assert!(PairRegistry::new(Vec::new()).resolve("BTC/BRL").is_none());
    }
}
