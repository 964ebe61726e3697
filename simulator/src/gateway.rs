use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::api::{ApiError, CreateOrderParams, MockApi};
use crate::chart::ChartConfig;
use crate::domain::{Notification, NotificationKind, Order, OrderBook, Trade, TradingPair, User};
use crate::feed::FeedConfig;
use crate::notifications::NotificationCenter;
use crate::session::Session;
use crate::websocket::websocket_handler;

pub struct AppState {
    pub api: MockApi,
    pub session: RwLock<Session>,
    pub notifications: RwLock<NotificationCenter>,
    /// Settings for the push feed opened per websocket connection.
    pub feed: FeedConfig,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(api: MockApi, feed: FeedConfig) -> Self {
        Self {
            api,
            session: RwLock::new(Session::default()),
            notifications: RwLock::new(NotificationCenter::default()),
            feed,
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{0} not found")]
    NotFound(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Api(ApiError::MissingCredentials) => StatusCode::UNAUTHORIZED,
            GatewayError::Api(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Path segments carry symbols as `BTC-BRL`.
pub fn path_symbol(raw: &str) -> String {
    raw.replace('-', "/")
}

#[derive(Debug, Deserialize)]
struct TradesQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct OrdersQuery {
    symbol: Option<String>,
    #[serde(default)]
    history: bool,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    authenticated: bool,
    token: Option<String>,
    user: Option<User>,
}

impl SessionResponse {
    fn from_session(session: &Session) -> Self {
        Self {
            authenticated: session.is_authenticated(),
            token: session.token().map(str::to_string),
            user: session.user().cloned(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewNotification {
    #[serde(rename = "type")]
    kind: NotificationKind,
    title: String,
    message: String,
    link: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsResponse {
    notifications: Vec<Notification>,
    unread_count: usize,
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn pairs_handler(State(state): State<SharedState>) -> Json<Vec<TradingPair>> {
    Json(state.api.trading_pairs().await)
}

async fn pair_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Result<Json<TradingPair>, GatewayError> {
    let symbol = path_symbol(&symbol);
    state
        .api
        .trading_pair(&symbol)
        .await
        .map(Json)
        .ok_or(GatewayError::NotFound(symbol))
}

async fn order_book_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Json<OrderBook> {
    Json(state.api.order_book(&path_symbol(&symbol)).await)
}

async fn trades_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
    Query(query): Query<TradesQuery>,
) -> Json<Vec<Trade>> {
    Json(state.api.recent_trades(&path_symbol(&symbol), query.limit).await)
}

async fn user_handler(State(state): State<SharedState>) -> Json<User> {
    Json(state.api.user().await)
}

async fn balance_handler(
    State(state): State<SharedState>,
    Path(currency): Path<String>,
) -> impl IntoResponse {
    let balance = state.api.user_balance(&currency).await;
    Json(json!({ "currency": currency, "balance": balance }))
}

async fn orders_handler(
    State(state): State<SharedState>,
    Query(query): Query<OrdersQuery>,
) -> Json<Vec<Order>> {
    let symbol = query.symbol.as_deref().map(path_symbol);
    let orders = if query.history {
        state.api.order_history(symbol.as_deref()).await
    } else {
        state.api.open_orders(symbol.as_deref()).await
    };
    Json(orders)
}

async fn create_order_handler(
    State(state): State<SharedState>,
    Json(params): Json<CreateOrderParams>,
) -> Result<(StatusCode, Json<Order>), GatewayError> {
    let order = state.api.create_order(params).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn cancel_order_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    if state.api.cancel_order(&id).await {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(GatewayError::NotFound(format!("order {id}")))
    }
}

async fn session_handler(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(SessionResponse::from_session(&*state.session.read().await))
}

async fn login_handler(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, GatewayError> {
    let mut session = state.session.write().await;
    session.login(&state.api, &req.email, &req.password).await?;
    Ok(Json(SessionResponse::from_session(&session)))
}

async fn logout_handler(State(state): State<SharedState>) -> Json<SessionResponse> {
    let mut session = state.session.write().await;
    session.logout();
    Json(SessionResponse::from_session(&session))
}

async fn notifications_handler(State(state): State<SharedState>) -> Json<NotificationsResponse> {
    let center = state.notifications.read().await;
    Json(NotificationsResponse {
        notifications: center.all().to_vec(),
        unread_count: center.unread_count(),
    })
}

async fn add_notification_handler(
    State(state): State<SharedState>,
    Json(req): Json<NewNotification>,
) -> impl IntoResponse {
    let id = state.notifications.write().await.add(
        req.kind,
        &req.title,
        &req.message,
        req.link.as_deref(),
    );
    (StatusCode::CREATED, Json(json!({ "id": id })))
}

async fn mark_read_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    if state.notifications.write().await.mark_as_read(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(GatewayError::NotFound(format!("notification {id}")))
    }
}

async fn mark_all_read_handler(State(state): State<SharedState>) -> StatusCode {
    state.notifications.write().await.mark_all_as_read();
    StatusCode::NO_CONTENT
}

async fn remove_notification_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, GatewayError> {
    if state.notifications.write().await.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(GatewayError::NotFound(format!("notification {id}")))
    }
}

async fn clear_notifications_handler(State(state): State<SharedState>) -> StatusCode {
    state.notifications.write().await.clear_all();
    StatusCode::NO_CONTENT
}

async fn chart_handler(Path(symbol): Path<String>) -> Json<ChartConfig> {
    Json(ChartConfig::for_pair(&path_symbol(&symbol)))
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/pairs", get(pairs_handler))
        .route("/pairs/:symbol", get(pair_handler))
        .route("/orderbook/:symbol", get(order_book_handler))
        .route("/trades/:symbol", get(trades_handler))
        .route("/user", get(user_handler))
        .route("/balances/:currency", get(balance_handler))
        .route("/orders", get(orders_handler).post(create_order_handler))
        .route("/orders/:id", delete(cancel_order_handler))
        .route("/session", get(session_handler))
        .route("/session/login", post(login_handler))
        .route("/session/logout", post(logout_handler))
        .route(
            "/notifications",
            get(notifications_handler)
                .post(add_notification_handler)
                .delete(clear_notifications_handler),
        )
        .route("/notifications/read-all", post(mark_all_read_handler))
        .route("/notifications/:id", delete(remove_notification_handler))
        .route("/notifications/:id/read", post(mark_read_handler))
        .route("/chart/:symbol", get(chart_handler))
        .route("/ws/:symbol", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: SharedState, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);

    info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Latency, MAX_TRADE_LIMIT};
    use crate::market::PairRegistry;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let api = MockApi::new(PairRegistry::default(), Latency::none());
        router(Arc::new(AppState::new(api, FeedConfig::default())))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app
            .clone()
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_pairs() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (_, body) = call(&app, Method::GET, "/pairs", None).await;
        assert_eq!(body.as_array().map(Vec::len), Some(3));
        assert_eq!(body[0]["lastPrice"], 488_334.0);

        let (status, body) = call(&app, Method::GET, "/pairs/ETH-BRL", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "ETH/BRL");

        let (status, _) = call(&app, Method::GET, "/pairs/ETH-USD", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_market_data_routes() {
        let app = app();
        let (_, book) = call(&app, Method::GET, "/orderbook/BTC-BRL", None).await;
        assert_eq!(book["asks"].as_array().map(Vec::len), Some(15));
        assert_eq!(book["bids"].as_array().map(Vec::len), Some(15));
        assert!(book["spreadPercent"].as_f64().unwrap() > 0.0);

        let (_, trades) = call(&app, Method::GET, "/trades/BTC-BRL?limit=7", None).await;
        assert_eq!(trades.as_array().map(Vec::len), Some(7));
        assert!(matches!(trades[0]["side"].as_str(), Some("buy") | Some("sell")));

        let (_, chart) = call(&app, Method::GET, "/chart/BTC-BRL", None).await;
        assert_eq!(chart["symbol"], "BINANCE:BTCBRL");
    }

    #[tokio::test]
    async fn test_huge_trade_limit_is_bounded() {
        let app = app();
        let (status, trades) = call(
            &app,
            Method::GET,
            "/trades/BTC-BRL?limit=1000000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(trades.as_array().map(Vec::len), Some(MAX_TRADE_LIMIT));
    }

    #[tokio::test]
    async fn test_order_lifecycle() {
        let app = app();
        let (status, order) = call(
            &app,
            Method::POST,
            "/orders",
            Some(json!({
                "pair": "ETH/BRL",
                "side": "sell",
                "type": "limit",
                "price": 19000.0,
                "amount": 1.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["status"], "open");
        let id = order["id"].as_str().unwrap().to_string();

        let (_, open) = call(&app, Method::GET, "/orders?symbol=ETH-BRL", None).await;
        assert_eq!(open.as_array().map(Vec::len), Some(1));

        for _ in 0..2 {
            let (status, body) = call(&app, Method::DELETE, &format!("/orders/{id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
        }

        let (_, open) = call(&app, Method::GET, "/orders?symbol=ETH-BRL", None).await;
        assert_eq!(open.as_array().map(Vec::len), Some(0));
        let (_, all) = call(&app, Method::GET, "/orders?symbol=ETH-BRL&history=true", None).await;
        assert_eq!(all[0]["status"], "cancelled");

        let (status, _) = call(&app, Method::DELETE, "/orders/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_order_is_bad_request() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/orders",
            Some(json!({
                "pair": "BTC/BRL",
                "side": "buy",
                "type": "limit",
                "price": 480000.0,
                "amount": -1.0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn test_session_routes() {
        let app = app();
        let (_, body) = call(&app, Method::GET, "/session", None).await;
        assert_eq!(body["authenticated"], false);

        let (status, _) = call(
            &app,
            Method::POST,
            "/session/login",
            Some(json!({ "email": "", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(
            &app,
            Method::POST,
            "/session/login",
            Some(json!({ "email": "me@example.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], "mock_token");
        assert_eq!(body["user"]["id"], "user-1");

        let (_, body) = call(&app, Method::POST, "/session/logout", None).await;
        assert_eq!(body["authenticated"], false);
    }

    #[tokio::test]
    async fn test_notification_routes() {
        let app = app();
        let (_, body) = call(&app, Method::GET, "/notifications", None).await;
        assert_eq!(body["unreadCount"], 2);

        let (status, body) = call(
            &app,
            Method::POST,
            "/notifications",
            Some(json!({ "type": "success", "title": "Withdrawal sent", "message": "On its way." })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "5");

        let (status, _) = call(&app, Method::POST, "/notifications/5/read", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::POST, "/notifications/read-all", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::DELETE, "/notifications/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::DELETE, "/notifications/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = call(&app, Method::GET, "/notifications", None).await;
        assert_eq!(body["unreadCount"], 0);
        assert_eq!(body["notifications"].as_array().map(Vec::len), Some(4));

        call(&app, Method::DELETE, "/notifications", None).await;
        let (_, body) = call(&app, Method::GET, "/notifications", None).await;
        assert_eq!(body["notifications"].as_array().map(Vec::len), Some(0));
    }
}
