use rand::Rng;

use crate::domain::{OrderBook, OrderBookEntry};

/// Number of price levels generated on each side.
pub const BOOK_DEPTH: usize = 15;

/// Distance between consecutive levels, as a fraction of the base price.
const LEVEL_STEP: f64 = 0.0002;
const MAX_LEVEL_AMOUNT: f64 = 0.5;

/// Synthesizes a fresh order book around `base_price`.
///
/// Level `i` (0-based) sits `(i + 1) * LEVEL_STEP` away from the base on each
/// side, so the best ask is always above and the best bid always below the
/// base for a positive price. Amounts are uniform in `[0, 0.5)`.
pub fn generate_order_book<R: Rng + ?Sized>(base_price: f64, rng: &mut R) -> OrderBook {
    let step = base_price * LEVEL_STEP;
    let mut asks = Vec::with_capacity(BOOK_DEPTH);
    let mut bids = Vec::with_capacity(BOOK_DEPTH);
    let mut ask_total = 0.0;
    let mut bid_total = 0.0;

    for i in 0..BOOK_DEPTH {
        let offset = (i + 1) as f64 * step;

        let amount = rng.gen::<f64>() * MAX_LEVEL_AMOUNT;
        ask_total += amount;
        asks.push(OrderBookEntry {
            price: base_price + offset,
            amount,
            total: ask_total,
        });

        let amount = rng.gen::<f64>() * MAX_LEVEL_AMOUNT;
        bid_total += amount;
        bids.push(OrderBookEntry {
            price: base_price - offset,
            amount,
            total: bid_total,
        });
    }

    let spread = asks[0].price - bids[0].price;
    let spread_percent = if base_price != 0.0 {
        spread / base_price * 100.0
    } else {
        0.0
    };

    OrderBook {
        asks,
        bids,
        spread,
        spread_percent,
    }
}
