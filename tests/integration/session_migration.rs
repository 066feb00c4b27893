//! Demonstrates §5's migration-tolerance requirement: once a connection
//! closes cleanly its session entry is gone, a peer still holding the old
//! address gets a soft 404 ("unknown socket") with no retry obligation, and
//! the same account reattaching -- even to a different node -- is reachable
//! again under its new session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gateway::codec::JsonCodec;
use gateway::connection::ConnectionManager;
use gateway::state::AppState;
use gateway::validation::ValidatorRegistry;
use gateway::{build_router, GatewayConfig};
use gateway_directory::SessionDirectory;
use gateway_test_support::FakeDirectoryClient;
use serde_json::json;

fn config() -> GatewayConfig {
    GatewayConfig {
        broadcast_path: "/primacron/broadcast".to_owned(),
        endpoint_path: "/stream/".to_owned(),
        redirect: None,
        namespace: "primacron".to_owned(),
        timeout: Duration::from_secs(900),
        address: "localhost".to_owned(),
        port: None,
        bind_addr: "0.0.0.0:0".to_owned(),
        redis_url: "redis://127.0.0.1/".to_owned(),
    }
}

async fn spawn_node(directory: Arc<FakeDirectoryClient>) -> (SocketAddr, AppState) {
    let cfg = config();
    let connections = Arc::new(ConnectionManager::new(Arc::new(JsonCodec)));
    let sessions = SessionDirectory::new(directory, cfg.namespace.clone(), cfg.timeout);
    let state = AppState::new(
        connections,
        sessions,
        Arc::new(ValidatorRegistry::new()),
        reqwest::Client::new(),
        cfg.broadcast_path.clone(),
        "http://node".to_owned(),
    );
    let router = build_router(state.clone(), &cfg);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    (addr, state)
}

#[tokio::test]
async fn closed_session_yields_404_then_reattachment_elsewhere_succeeds() {
    let directory = Arc::new(FakeDirectoryClient::default());
    let (addr_a, state_a) = spawn_node(directory.clone()).await;
    let (addr_b, state_b) = spawn_node(directory.clone()).await;

    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr_a}/stream/?account=foo"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let conn = state_a.connections.all_for_account("foo").await.remove(0);
    let session = conn.session.clone();
    let conn_id = conn.id.clone();

    let location = state_a.sessions.lookup("foo", &session).await.unwrap().unwrap();
    assert_eq!(location.conn_id, conn_id);

    // Clean disconnect: dropping the client socket closes the server-side
    // task, which must unregister the session entry.
    drop(ws);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state_a.sessions.lookup("foo", &session).await.unwrap().is_none());

    // A peer still holding the stale `(node, connId)` address gets a soft
    // 404, not an `error::invalid` -- this is the common case of a migrated
    // session, not a malformed request.
    let mut events = state_a.subscribe();
    let response = reqwest::Client::new()
        .put(format!("http://{addr_a}/primacron/broadcast"))
        .json(&json!({"id": conn_id, "message": "stale"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    assert!(events.try_recv().is_err(), "a 404 on a migrated session must not emit error::invalid");

    // The same account reattaches, this time to node B, and is reachable
    // again under a fresh session id that the directory now resolves to
    // node B's address.
    let (_ws2, _) = tokio_tungstenite::connect_async(format!("ws://{addr_b}/stream/?account=foo"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let new_conn = state_b.connections.all_for_account("foo").await.remove(0);
    assert_ne!(new_conn.session, session, "reattachment must mint a fresh session id");

    let new_location = state_b.sessions.lookup("foo", &new_conn.session).await.unwrap().unwrap();
    assert_eq!(new_location.conn_id, new_conn.id);

    let response = reqwest::Client::new()
        .put(format!("http://{addr_b}/primacron/broadcast"))
        .json(&json!({"id": new_conn.id, "message": "hi again"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
