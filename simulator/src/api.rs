use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Order, OrderBook, OrderSide, OrderStatus, OrderType, Trade, TradingPair, User};
use crate::market::{generate_order_book, generate_recent_trades, PairRegistry, TAPE_CAPACITY};

/// Most trades a single `recent_trades` call generates; larger limits are clamped.
pub const MAX_TRADE_LIMIT: usize = 500;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unknown trading pair: {0}")]
    UnknownPair(String),
    #[error("order amount must be positive, got {0}")]
    InvalidAmount(f64),
    #[error("limit order requires a positive price, got {0}")]
    InvalidPrice(f64),
    #[error("email and password are required")]
    MissingCredentials,
}

/// Artificial response delays, grouped by how heavy the call pretends to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub short: Duration,  // single lookups
    pub medium: Duration, // lists, user data, cancel
    pub long: Duration,   // order placement
}

impl Latency {
    pub fn realistic() -> Self {
        Self {
            short: Duration::from_millis(50),
            medium: Duration::from_millis(100),
            long: Duration::from_millis(200),
        }
    }

    pub fn none() -> Self {
        Self {
            short: Duration::ZERO,
            medium: Duration::ZERO,
            long: Duration::ZERO,
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::realistic()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderParams {
    pub pair: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub price: f64,
    pub amount: f64,
}

/// In-memory exchange API. Every call succeeds after a fixed delay unless
/// its input is malformed.
pub struct MockApi {
    registry: PairRegistry,
    user: User,
    orders: RwLock<Vec<Order>>,
    latency: Latency,
}

impl MockApi {
    pub fn new(registry: PairRegistry, latency: Latency) -> Self {
        Self {
            registry,
            user: demo_user(),
            orders: RwLock::new(seed_orders()),
            latency,
        }
    }

    pub fn registry(&self) -> &PairRegistry {
        &self.registry
    }

    async fn delay(&self, duration: Duration) {
        if !duration.is_zero() {
            sleep(duration).await;
        }
    }

    pub async fn trading_pairs(&self) -> Vec<TradingPair> {
        self.delay(self.latency.medium).await;
        self.registry.pairs().to_vec()
    }

    pub async fn trading_pair(&self, symbol: &str) -> Option<TradingPair> {
        self.delay(self.latency.short).await;
        self.registry.find(symbol).cloned()
    }

    /// Unlisted symbols get a book around the default base price.
    pub async fn order_book(&self, symbol: &str) -> OrderBook {
        self.delay(self.latency.short).await;
        let base_price = self.registry.base_price(symbol);
        generate_order_book(base_price, &mut rand::thread_rng())
    }

    /// `limit` defaults to the tape size and is clamped to [`MAX_TRADE_LIMIT`].
    pub async fn recent_trades(&self, symbol: &str, limit: Option<usize>) -> Vec<Trade> {
        self.delay(self.latency.short).await;
        let base_price = self.registry.base_price(symbol);
        let count = limit.unwrap_or(TAPE_CAPACITY).min(MAX_TRADE_LIMIT);
        generate_recent_trades(base_price, count, Utc::now(), &mut rand::thread_rng())
    }

    pub async fn user(&self) -> User {
        self.delay(self.latency.medium).await;
        self.user.clone()
    }

    /// Zero for currencies the user holds nothing of.
    pub async fn user_balance(&self, currency: &str) -> f64 {
        self.delay(self.latency.short).await;
        self.user.balance(currency)
    }

    /// Orders still on the book, optionally restricted to one pair.
    pub async fn open_orders(&self, symbol: Option<&str>) -> Vec<Order> {
        self.delay(self.latency.medium).await;
        self.orders
            .read()
            .await
            .iter()
            .filter(|o| o.status.is_active())
            .filter(|o| symbol.map_or(true, |s| o.pair == s))
            .cloned()
            .collect()
    }

    /// Every order ever placed, including cancelled ones.
    pub async fn order_history(&self, symbol: Option<&str>) -> Vec<Order> {
        self.delay(self.latency.medium).await;
        self.orders
            .read()
            .await
            .iter()
            .filter(|o| symbol.map_or(true, |s| o.pair == s))
            .cloned()
            .collect()
    }

    pub async fn create_order(&self, params: CreateOrderParams) -> Result<Order, ApiError> {
        self.delay(self.latency.long).await;

        if self.registry.find(&params.pair).is_none() {
            return Err(ApiError::UnknownPair(params.pair));
        }
        if !(params.amount.is_finite() && params.amount > 0.0) {
            return Err(ApiError::InvalidAmount(params.amount));
        }
        if params.order_type == OrderType::Limit && !(params.price.is_finite() && params.price > 0.0) {
            return Err(ApiError::InvalidPrice(params.price));
        }

        let order = Order {
            id: format!("order-{}", Uuid::new_v4()),
            pair: params.pair,
            side: params.side,
            order_type: params.order_type,
            price: params.price,
            amount: params.amount,
            filled: 0.0,
            status: OrderStatus::Open,
            created_at: Utc::now(),
        };
        info!(
            "order placed: {} {} {} {} @ {}",
            order.id, order.side, order.amount, order.pair, order.price
        );
        self.orders.write().await.push(order.clone());
        Ok(order)
    }

    /// Cancels `order_id`. Returns `false` only when the id is unknown;
    /// orders already cancelled or filled are left as they are.
    pub async fn cancel_order(&self, order_id: &str) -> bool {
        self.delay(self.latency.medium).await;
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == order_id) else {
            return false;
        };
        if order.status.is_active() {
            order.status = OrderStatus::Cancelled;
            info!("order cancelled: {}", order.id);
        }
        true
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new(PairRegistry::default(), Latency::default())
    }
}

fn demo_user() -> User {
    let balances = BTreeMap::from([
        ("BRL".to_string(), 50_000.00),
        ("BTC".to_string(), 0.5),
        ("ETH".to_string(), 5.0),
        ("USDT".to_string(), 1_000.00),
    ]);
    User {
        id: "user-1".to_string(),
        name: "Demo Trader".to_string(),
        email: "demo@example.com".to_string(),
        balances,
    }
}

fn seed_orders() -> Vec<Order> {
    let now = Utc::now();
    vec![
        Order {
            id: "order-1".to_string(),
            pair: "BTC/BRL".to_string(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            price: 480_000.00,
            amount: 0.01,
            filled: 0.0,
            status: OrderStatus::Open,
            created_at: now - chrono::Duration::hours(1),
        },
        Order {
            id: "order-2".to_string(),
            pair: "BTC/BRL".to_string(),
            side: OrderSide::Sell,
            order_type: OrderType::Limit,
            price: 495_000.00,
            amount: 0.02,
            filled: 0.005,
            status: OrderStatus::Partial,
            created_at: now - chrono::Duration::hours(2),
        },
    ]
}
