use std::net::SocketAddr;
use std::time::Duration;

use structopt::StructOpt;

use crate::api::Latency;
use crate::feed::FeedConfig;

#[derive(Debug, StructOpt)]
#[structopt(name = "market-sim", about = "Mock exchange market data simulator")]
pub enum Command {
    /// Serve the mock exchange API and push feed over HTTP/WebSocket
    Serve(ServeOpts),
    /// Run a push feed locally and log what it emits
    Watch(WatchOpts),
}

#[derive(Debug, StructOpt)]
pub struct FeedOpts {
    /// Ticker interval in milliseconds
    #[structopt(long, env = "SIM_TICKER_MS", default_value = "2000")]
    pub ticker_ms: u64,
    /// Order book refresh interval in milliseconds
    #[structopt(long, env = "SIM_ORDERBOOK_MS", default_value = "1000")]
    pub orderbook_ms: u64,
    /// Trade interval in milliseconds
    #[structopt(long, env = "SIM_TRADE_MS", default_value = "3000")]
    pub trade_ms: u64,
    /// Fixed RNG seed for reproducible feeds
    #[structopt(long, env = "SIM_SEED")]
    pub seed: Option<u64>,
}

impl FeedOpts {
    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            ticker_interval: Duration::from_millis(self.ticker_ms.max(1)),
            order_book_interval: Duration::from_millis(self.orderbook_ms.max(1)),
            trade_interval: Duration::from_millis(self.trade_ms.max(1)),
            seed: self.seed,
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct ServeOpts {
    /// Address to listen on
    #[structopt(long, env = "SIM_ADDR", default_value = "127.0.0.1:3000")]
    pub addr: SocketAddr,
    /// Answer API calls immediately instead of after the artificial delay
    #[structopt(long)]
    pub no_latency: bool,
    #[structopt(flatten)]
    pub feed: FeedOpts,
}

impl ServeOpts {
    pub fn latency(&self) -> Latency {
        if self.no_latency {
            Latency::none()
        } else {
            Latency::realistic()
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct WatchOpts {
    /// Pair to watch, e.g. BTC/BRL
    #[structopt(default_value = "BTC/BRL")]
    pub symbol: String,
    /// Stop after this many events
    #[structopt(long, default_value = "20")]
    pub events: usize,
    #[structopt(flatten)]
    pub feed: FeedOpts,
}
