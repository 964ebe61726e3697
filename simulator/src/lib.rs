pub mod api;
pub mod chart;
pub mod config;
pub mod domain;
pub mod feed;
pub mod gateway;
pub mod market;
pub mod notifications;
pub mod session;
pub mod websocket;

pub use api::{ApiError, CreateOrderParams, Latency, MockApi};
pub use feed::{EventKind, FeedConfig, FeedEvent, MarketView, MockSocket};
pub use market::PairRegistry;
