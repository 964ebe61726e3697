use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{OrderBook, Trade, TradingPair};
use crate::feed::{EventKind, FeedEvent, MarketView, MockSocket};
use crate::gateway::{path_symbol, SharedState};
use crate::market::TradeTape;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum WebSocketMessage {
    /// Sent once on connect: pair, full book and recent trades.
    Snapshot(MarketView),
    Ticker(TradingPair),
    OrderBook(OrderBook),
    Trade(Trade), // only the new trade, not the whole tape
}

impl From<FeedEvent> for WebSocketMessage {
    fn from(event: FeedEvent) -> Self {
        match event {
            FeedEvent::Ticker(pair) => WebSocketMessage::Ticker(pair),
            FeedEvent::OrderBook(book) => WebSocketMessage::OrderBook(book),
            FeedEvent::Trade(trade) => WebSocketMessage::Trade(trade),
        }
    }
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(symbol): Path<String>,
    State(state): State<SharedState>,
) -> Response {
    let symbol = path_symbol(&symbol);
    ws.on_upgrade(move |socket| handle_socket(socket, state, symbol))
}

async fn handle_socket(socket: WebSocket, state: SharedState, symbol: String) {
    let (sender, receiver) = socket.split();
    run_connection(sender, receiver, state, symbol).await;
}

/// Streams one pair's market data to a client until either side hangs up.
///
/// Sends a snapshot first, then every event of a push feed opened for this
/// connection. Returns that feed, already closed, or `None` when no pair is
/// listed.
async fn run_connection<S, R, E>(
    sink: S,
    stream: R,
    state: SharedState,
    symbol: String,
) -> Option<MockSocket>
where
    S: Sink<Message> + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Send + 'static,
    E: Send + 'static,
{
    let Some(pair) = state.api.registry().resolve(&symbol) else {
        warn!("no trading pairs listed, dropping websocket for {}", symbol);
        return None;
    };
    info!("websocket opened for {} (bound to {})", symbol, pair.symbol);

    let (tx, mut rx) = mpsc::unbounded_channel::<WebSocketMessage>();

    let order_book = state.api.order_book(&pair.symbol).await;
    let trades = state.api.recent_trades(&pair.symbol, None).await;
    let view = MarketView::new(pair.clone(), order_book, TradeTape::from_history(trades));
    if tx.send(WebSocketMessage::Snapshot(view)).is_err() {
        warn!("failed to queue snapshot for {}", pair.symbol);
    }

    // One feed per connection; it is closed when the connection ends.
    let feed = MockSocket::connect(pair, &state.feed);
    for kind in [EventKind::Ticker, EventKind::OrderBook, EventKind::Trade] {
        let tx = tx.clone();
        feed.on(kind, move |event| {
            let _ = tx.send(event.clone().into());
        });
    }
    drop(tx);

    let mut send_task = tokio::spawn(async move {
        futures_util::pin_mut!(sink);
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sink.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("failed to encode websocket message: {:?}", e),
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        futures_util::pin_mut!(stream);
        while let Some(Ok(msg)) = stream.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    feed.close();
    info!("websocket closed for {}", feed.symbol());
    Some(feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Latency, MockApi};
    use crate::feed::FeedConfig;
    use crate::gateway::AppState;
    use crate::market::{generate_trade, PairRegistry};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::error::TryRecvError;

    fn frame_json(msg: Message) -> Value {
        match msg {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_streams_then_closes_feed() {
        let api = MockApi::new(PairRegistry::default(), Latency::none());
        let feed = FeedConfig {
            seed: Some(99),
            ..FeedConfig::default()
        };
        let state = Arc::new(AppState::new(api, feed));

        // server -> client frames
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let sink = futures_util::sink::unfold(out_tx, |tx, msg: Message| async move {
            match tx.send(msg) {
                Ok(()) => Ok(tx),
                Err(_) => Err(()),
            }
        });
        // client -> server frames
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Message>();
        let stream = futures_util::stream::unfold(in_rx, |mut rx| async move {
            rx.recv().await.map(|msg| (Ok::<_, ()>(msg), rx))
        });

        let connection = tokio::spawn(run_connection(sink, stream, state, "ETH/BRL".to_string()));

        let snapshot = frame_json(out_rx.recv().await.expect("snapshot frame"));
        assert_eq!(snapshot["type"], "snapshot");
        assert_eq!(snapshot["data"]["pair"]["symbol"], "ETH/BRL");
        assert_eq!(snapshot["data"]["trades"].as_array().map(Vec::len), Some(20));

        let update = frame_json(out_rx.recv().await.expect("first feed frame"));
        assert_eq!(update["type"], "orderbook");
        assert_eq!(update["data"]["asks"].as_array().map(Vec::len), Some(15));

        // client hangs up
        drop(in_tx);
        let feed = connection
            .await
            .unwrap()
            .expect("pair listed, feed opened");
        assert!(feed.is_closed());

        while out_rx.try_recv().is_ok() {}
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(out_rx.try_recv(), Err(TryRecvError::Disconnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_frame_ends_connection() {
        let api = MockApi::new(PairRegistry::default(), Latency::none());
        let state = Arc::new(AppState::new(api, FeedConfig::default()));

        let (out_tx, _out_rx) = mpsc::unbounded_channel::<Message>();
        let sink = futures_util::sink::unfold(out_tx, |tx, msg: Message| async move {
            match tx.send(msg) {
                Ok(()) => Ok(tx),
                Err(_) => Err(()),
            }
        });
        // the client sends a close frame but keeps the stream open
        let stream = futures_util::stream::iter(vec![Ok::<_, ()>(Message::Close(None))])
            .chain(futures_util::stream::pending());

        let feed = run_connection(sink, stream, state, "DOGE/BRL".to_string())
            .await
            .expect("falls back to the first pair");
        assert_eq!(feed.symbol(), "BTC/BRL");
        assert!(feed.is_closed());
    }

    #[test]
    fn test_feed_events_are_tagged() {
        let mut rng = StdRng::seed_from_u64(8);
        let trade = generate_trade(100.0, Utc::now(), &mut rng);
        let msg: WebSocketMessage = FeedEvent::Trade(trade.clone()).into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "trade");
        assert_eq!(json["data"]["id"], trade.id);

        let pair = PairRegistry::default().resolve("BTC/BRL").unwrap();
        let json = serde_json::to_value(WebSocketMessage::from(FeedEvent::Ticker(pair))).unwrap();
        assert_eq!(json["type"], "ticker");
        assert_eq!(json["data"]["symbol"], "BTC/BRL");
    }

    #[test]
    fn test_snapshot_carries_tape_as_list() {
        let mut rng = StdRng::seed_from_u64(10);
        let pair = PairRegistry::default().resolve("USDT/BRL").unwrap();
        let mut tape = TradeTape::default();
        tape.push(generate_trade(pair.last_price, Utc::now(), &mut rng));
        let view = MarketView::new(pair, OrderBook::default(), tape);

        let json = serde_json::to_value(WebSocketMessage::Snapshot(view)).unwrap();
        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["data"]["pair"]["symbol"], "USDT/BRL");
        assert_eq!(json["data"]["trades"].as_array().map(Vec::len), Some(1));
        assert!(json["data"]["orderBook"]["asks"].as_array().unwrap().is_empty());
    }
}
