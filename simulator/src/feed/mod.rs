//! Timer-driven stand-in for a real-time market data push feed.
//!
//! A [`MockSocket`] binds to one trading pair and runs three independent
//! interval timers (ticker, order book, trade). Each tick mutates or
//! regenerates data and hands the resulting [`FeedEvent`] synchronously to
//! every subscriber of that event kind, in registration order.

pub mod event;
pub mod view;

pub use event::{EventKind, FeedEvent};
pub use view::MarketView;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::domain::TradingPair;
use crate::market::{generate_order_book, generate_trade, PairRegistry};

/// Relative price window per ticker tick: full window 0.1%, i.e. ±0.05%.
const PRICE_DRIFT: f64 = 0.001;
/// Window for the 24h change per ticker tick: 0.1 percentage points, i.e. ±0.05.
const CHANGE_DRIFT: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ticker_interval: Duration,
    pub order_book_interval: Duration,
    pub trade_interval: Duration,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ticker_interval: Duration::from_secs(2),
            order_book_interval: Duration::from_secs(1),
            trade_interval: Duration::from_secs(3),
            seed: None,
        }
    }
}

pub type SubscriptionId = u64;

type Callback = Box<dyn FnMut(&FeedEvent) + Send>;

struct Subscriber {
    id: SubscriptionId,
    kind: EventKind,
    callback: Callback,
}

struct FeedState {
    pair: TradingPair,
    rng: StdRng,
    subscribers: Vec<Subscriber>,
    next_id: SubscriptionId,
    closed: bool,
}

impl FeedState {
    fn tick_price(&mut self) -> FeedEvent {
        let change = (self.rng.gen::<f64>() - 0.5) * self.pair.last_price * PRICE_DRIFT;
        self.pair.last_price += change;
        self.pair.change_24h += (self.rng.gen::<f64>() - 0.5) * CHANGE_DRIFT;
        FeedEvent::Ticker(self.pair.clone())
    }

    fn tick_order_book(&mut self) -> FeedEvent {
        FeedEvent::OrderBook(generate_order_book(self.pair.last_price, &mut self.rng))
    }

    fn tick_trade(&mut self) -> FeedEvent {
        FeedEvent::Trade(generate_trade(self.pair.last_price, Utc::now(), &mut self.rng))
    }

    fn emit(&mut self, event: &FeedEvent) {
        let kind = event.kind();
        for sub in self.subscribers.iter_mut().filter(|s| s.kind == kind) {
            (sub.callback)(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Push simulator bound to a single trading pair.
///
/// Callbacks run on the timer task while the feed's state lock is held, so
/// they must not call back into the same socket (`on`, `off`, `close`).
/// Dropping the socket closes it.
pub struct MockSocket {
    symbol: String,
    state: Arc<Mutex<FeedState>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl MockSocket {
    /// Starts the three timers. Must be called from within a tokio runtime.
    pub fn connect(pair: TradingPair, config: &FeedConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let symbol = pair.symbol.clone();
        let state = Arc::new(Mutex::new(FeedState {
            pair,
            rng,
            subscribers: Vec::new(),
            next_id: 0,
            closed: false,
        }));

        let timers = vec![
            spawn_timer(state.clone(), config.ticker_interval, FeedState::tick_price),
            spawn_timer(state.clone(), config.order_book_interval, FeedState::tick_order_book),
            spawn_timer(state.clone(), config.trade_interval, FeedState::tick_trade),
        ];
        debug!("mock socket opened for {}", symbol);

        Self {
            symbol,
            state,
            timers: Mutex::new(timers),
        }
    }

    /// Binds to `symbol`, or to the first listed pair when it is unknown.
    /// Returns `None` only when the registry is empty.
    pub fn for_symbol(registry: &PairRegistry, symbol: &str, config: &FeedConfig) -> Option<Self> {
        registry
            .resolve(symbol)
            .map(|pair| Self::connect(pair, config))
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current state of the bound pair.
    pub fn pair(&self) -> TradingPair {
        lock(&self.state).pair.clone()
    }

    /// Registers `callback` for `kind`. On a closed socket the callback is
    /// dropped and will never run.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> SubscriptionId
    where
        F: FnMut(&FeedEvent) + Send + 'static,
    {
        let mut state = lock(&self.state);
        let id = state.next_id;
        state.next_id += 1;
        if !state.closed {
            debug!("{} subscriber {} added on {}", kind.as_str(), id, self.symbol);
            state.subscribers.push(Subscriber {
                id,
                kind,
                callback: Box::new(callback),
            });
        }
        id
    }

    /// Removes a subscription. Returns whether it was registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut state = lock(&self.state);
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != id);
        state.subscribers.len() != before
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    /// Stops all timers and drops every subscriber. Safe to call repeatedly;
    /// once it returns no callback will run again.
    pub fn close(&self) {
        {
            let mut state = lock(&self.state);
            if !state.closed {
                state.closed = true;
                state.subscribers.clear();
                debug!("mock socket closed for {}", self.symbol);
            }
        }
        for timer in lock(&self.timers).drain(..) {
            timer.abort();
        }
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_timer(
    state: Arc<Mutex<FeedState>>,
    period: Duration,
    step: fn(&mut FeedState) -> FeedEvent,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // first emission one full period after start
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut guard = lock(&state);
            if guard.closed {
                break;
            }
            let event = step(&mut guard);
            guard.emit(&event);
        }
    })
}
