use serde::Serialize;

use crate::domain::{OrderBook, TradingPair};
use crate::feed::FeedEvent;
use crate::market::TradeTape;

/// What a trading screen shows for one pair, kept current by applying
/// feed events in arrival order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketView {
    pub pair: TradingPair,
    pub order_book: OrderBook,
    pub trades: TradeTape,
}

impl MarketView {
    pub fn new(pair: TradingPair, order_book: OrderBook, trades: TradeTape) -> Self {
        Self {
            pair,
            order_book,
            trades,
        }
    }

    pub fn apply(&mut self, event: &FeedEvent) {
        match event {
            FeedEvent::Ticker(pair) => self.pair = pair.clone(),
            // books are replaced wholesale, never diffed
            FeedEvent::OrderBook(book) => self.order_book = book.clone(),
            FeedEvent::Trade(trade) => self.trades.push(trade.clone()),
        }
    }
}
