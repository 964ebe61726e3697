pub mod notification;
pub mod order;
pub mod order_book;
pub mod pair;
pub mod trade;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use order::{Order, OrderSide, OrderStatus, OrderType};
pub use order_book::{OrderBook, OrderBookEntry};
pub use pair::TradingPair;
pub use trade::Trade;
pub use user::User;
