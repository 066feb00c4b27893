pub mod bootstrap;
pub mod codec;
pub mod config;
pub mod connection;
pub mod inbound_broadcast;
pub mod observability;
pub mod peer_broadcast;
pub mod state;
pub mod tail_fanout;
pub mod validation;
pub mod ws_transport;

pub use config::GatewayConfig;
pub use state::AppState;

use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::Router;

pub const POWERED_BY_VALUE: &str = concat!("primacron-gateway/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP Front Door (§4.9): a single router implementing the
/// exact dispatch precedence -- realtime transport, then any other
/// WebSocket upgrade, then the broadcast path, then an optional redirect,
/// then a bare 400.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let endpoint_path = config.endpoint_path.clone();
    let broadcast_path = config.broadcast_path.clone();
    let redirect = config.redirect.clone();

    Router::new()
        .route(&endpoint_path, get(ws_transport::handle))
        .route(&broadcast_path, put(inbound_broadcast::handle))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/primacron/events", get(observability::stream))
        .fallback(move |method: Method, uri: Uri, ws: Option<axum::extract::ws::WebSocketUpgrade>| {
            let redirect = redirect.clone();
            async move { front_door_fallback(method, uri, ws, redirect).await }
        })
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Anything that reaches the fallback already failed to match the realtime
/// transport route and the broadcast route; this implements the remaining
/// three branches of §4.9's dispatch order.
async fn front_door_fallback(
    _method: Method,
    _uri: Uri,
    ws: Option<axum::extract::ws::WebSocketUpgrade>,
    redirect: Option<String>,
) -> Response {
    if let Some(ws) = ws {
        // WebSocket upgrade on any path other than the realtime endpoint:
        // close without a response body, since an upgraded connection
        // cannot carry an HTTP redirect.
        return ws.on_upgrade(|socket| async move { drop(socket) }).into_response();
    }

    if let Some(location) = redirect {
        return (
            StatusCode::MOVED_PERMANENTLY,
            [(axum::http::header::LOCATION, location)],
        )
            .into_response();
    }

    StatusCode::BAD_REQUEST.into_response()
}

async fn healthz() -> impl IntoResponse {
    "ok"
}

async fn readyz() -> impl IntoResponse {
    "ok"
}
