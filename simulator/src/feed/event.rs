use serde::Serialize;

use crate::domain::{OrderBook, Trade, TradingPair};

/// Channels a push feed emits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ticker,
    OrderBook,
    Trade,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Ticker => "ticker",
            EventKind::OrderBook => "orderbook",
            EventKind::Trade => "trade",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum FeedEvent {
    /// Copy of the bound pair after its price moved.
    Ticker(TradingPair),
    OrderBook(OrderBook),
    Trade(Trade),
}

impl FeedEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FeedEvent::Ticker(_) => EventKind::Ticker,
            FeedEvent::OrderBook(_) => EventKind::OrderBook,
            FeedEvent::Trade(_) => EventKind::Trade,
        }
    }
}
