use std::sync::Arc;

use color_eyre::eyre::{self, eyre};
use structopt::StructOpt;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use market_sim::config::{Command, ServeOpts, WatchOpts};
use market_sim::feed::{EventKind, FeedEvent, MarketView, MockSocket};
use market_sim::gateway::{self, AppState};
use market_sim::market::TradeTape;
use market_sim::MockApi;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // init error reporting
    color_eyre::install()?;

    // .env is optional
    dotenv::dotenv().ok();

    // init logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match Command::from_args() {
        Command::Serve(opts) => run_server(opts).await,
        Command::Watch(opts) => run_watch(opts).await,
    }
}

async fn run_server(opts: ServeOpts) -> eyre::Result<()> {
    let api = MockApi::new(Default::default(), opts.latency());
    let state = Arc::new(AppState::new(api, opts.feed.feed_config()));

    info!(
        "serving {} pairs (latency: {})",
        state.api.registry().pairs().len(),
        if opts.no_latency { "off" } else { "on" }
    );
    gateway::serve(state, opts.addr).await?;
    Ok(())
}

async fn run_watch(opts: WatchOpts) -> eyre::Result<()> {
    let api = MockApi::new(Default::default(), Default::default());
    let pair = api
        .registry()
        .resolve(&opts.symbol)
        .ok_or_else(|| eyre!("no trading pairs listed"))?;
    if pair.symbol != opts.symbol {
        info!("{} is not listed, watching {} instead", opts.symbol, pair.symbol);
    }

    let order_book = api.order_book(&pair.symbol).await;
    let trades = TradeTape::from_history(api.recent_trades(&pair.symbol, None).await);
    let mut view = MarketView::new(pair.clone(), order_book, trades);

    let (tx, mut rx) = mpsc::unbounded_channel::<FeedEvent>();
    let feed = MockSocket::connect(pair, &opts.feed.feed_config());
    for kind in [EventKind::Ticker, EventKind::OrderBook, EventKind::Trade] {
        let tx = tx.clone();
        feed.on(kind, move |event| {
            let _ = tx.send(event.clone());
        });
    }
    drop(tx);

    let mut seen = 0;
    while seen < opts.events {
        let Some(event) = rx.recv().await else {
            break;
        };
        view.apply(&event);
        seen += 1;

        match event.kind() {
            EventKind::Ticker => info!(
                "[{}] last {:.2} ({:+.2}%)",
                view.pair.symbol, view.pair.last_price, view.pair.change_24h
            ),
            EventKind::OrderBook => info!(
                "[{}] bid {:.2} / ask {:.2} spread {:.4}%",
                view.pair.symbol,
                view.order_book.best_bid().map_or(0.0, |l| l.price),
                view.order_book.best_ask().map_or(0.0, |l| l.price),
                view.order_book.spread_percent
            ),
            EventKind::Trade => {
                if let Some(trade) = view.trades.latest() {
                    info!(
                        "[{}] {} {:.6} @ {:.2} ({} on tape)",
                        view.pair.symbol,
                        trade.side,
                        trade.amount,
                        trade.price,
                        view.trades.len()
                    );
                }
            }
        }
    }

    feed.close();
    info!("watched {} events", seen);
    Ok(())
}
