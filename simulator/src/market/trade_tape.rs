use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::{OrderSide, Trade};

/// How many trades a tape keeps.
pub const TAPE_CAPACITY: usize = 20;

/// Spacing between generated historical trades.
const HISTORY_SPACING_SECS: i64 = 30;
/// Width of the price window for historical trades (0.5% of base).
const HISTORY_PRICE_WINDOW: f64 = 0.005;
const HISTORY_MAX_AMOUNT: f64 = 0.1;

/// Width of the price window for a single live trade (0.1% of last price).
const LIVE_PRICE_WINDOW: f64 = 0.001;
const LIVE_MAX_AMOUNT: f64 = 0.05;

fn random_side<R: Rng + ?Sized>(rng: &mut R) -> OrderSide {
    if rng.gen_bool(0.5) {
        OrderSide::Buy
    } else {
        OrderSide::Sell
    }
}

/// Synthesizes `count` past trades, newest first, spaced 30s apart walking
/// back from `now`.
pub fn generate_recent_trades<R: Rng + ?Sized>(
    base_price: f64,
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Trade> {
    (0..count)
        .map(|i| {
            let variation = (rng.gen::<f64>() - 0.5) * base_price * HISTORY_PRICE_WINDOW;
            Trade {
                id: format!("trade-{i}"),
                price: base_price + variation,
                amount: rng.gen::<f64>() * HISTORY_MAX_AMOUNT,
                timestamp: now - Duration::seconds(i as i64 * HISTORY_SPACING_SECS),
                side: random_side(rng),
            }
        })
        .collect()
}

/// Synthesizes one live trade around `last_price`.
pub fn generate_trade<R: Rng + ?Sized>(last_price: f64, now: DateTime<Utc>, rng: &mut R) -> Trade {
    let variation = (rng.gen::<f64>() - 0.5) * last_price * LIVE_PRICE_WINDOW;
    Trade {
        id: format!("trade-{}", now.timestamp_millis()),
        price: last_price + variation,
        amount: rng.gen::<f64>() * LIVE_MAX_AMOUNT,
        timestamp: now,
        side: random_side(rng),
    }
}

/// Bounded list of recent trades, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct TradeTape {
    trades: VecDeque<Trade>,
    #[serde(skip)]
    capacity: usize,
}

impl TradeTape {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Builds a tape from trades already ordered newest first, keeping
    /// at most `TAPE_CAPACITY` of them.
    pub fn from_history(trades: Vec<Trade>) -> Self {
        let mut tape = Self::with_capacity(TAPE_CAPACITY);
        tape.trades.extend(trades.into_iter().take(TAPE_CAPACITY));
        tape
    }

    pub fn push(&mut self, trade: Trade) {
        self.trades.push_front(trade);
        self.trades.truncate(self.capacity);
    }

    pub fn latest(&self) -> Option<&Trade> {
        self.trades.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

impl Default for TradeTape {
    fn default() -> Self {
        Self::with_capacity(TAPE_CAPACITY)
    }
}
