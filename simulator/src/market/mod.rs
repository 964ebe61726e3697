pub mod order_book;
pub mod registry;
pub mod trade_tape;

pub use order_book::{generate_order_book, BOOK_DEPTH};
pub use registry::{PairRegistry, DEFAULT_BASE_PRICE};
pub use trade_tape::{generate_recent_trades, generate_trade, TradeTape, TAPE_CAPACITY};
