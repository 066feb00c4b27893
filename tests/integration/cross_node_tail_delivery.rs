//! Two independently-listening gateway nodes, sharing one in-memory
//! directory fake, exercising the cluster's whole point: a client attached
//! to node A can deliver a validated message to a tailgator attached to
//! node B purely through the directory + peer-broadcast protocol, with
//! neither node aware of the other's local connection state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use gateway::codec::JsonCodec;
use gateway::connection::ConnectionManager;
use gateway::state::AppState;
use gateway::validation::{LegacyAdapter, LegacyValidator, ValidationOutcome, ValidatorRegistry};
use gateway::{build_router, GatewayConfig};
use gateway_directory::SessionDirectory;
use gateway_test_support::FakeDirectoryClient;
use serde_json::json;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

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

async fn spawn_node(
    directory: Arc<FakeDirectoryClient>,
    validators: Arc<ValidatorRegistry>,
) -> (SocketAddr, AppState) {
    let cfg = config();
    let connections = Arc::new(ConnectionManager::new(Arc::new(JsonCodec)));
    let sessions = SessionDirectory::new(directory, cfg.namespace.clone(), cfg.timeout);
    let state = AppState::new(
        connections,
        sessions,
        validators,
        reqwest::Client::new(),
        cfg.broadcast_path.clone(),
        format!("http://node-{}", uuid_like()),
    );

    let router = build_router(state.clone(), &cfg);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    (addr, state)
}

/// A cheap unique-enough suffix so the two nodes' `node_url`s (used purely
/// as directory values, not dialled) don't collide; the real HTTP dialing
/// in this test always goes to the `SocketAddr` axum actually bound.
fn uuid_like() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed).to_string()
}

struct AcceptAll;

impl LegacyValidator for AcceptAll {
    fn arity(&self) -> usize {
        3
    }

    fn invoke(&self, args: Vec<Option<serde_json::Value>>, complete: oneshot::Sender<ValidationOutcome>) {
        complete
            .send(ValidationOutcome::Accepted {
                data: args.into_iter().flatten().collect(),
            })
            .ok();
    }
}

#[tokio::test]
async fn validated_message_fans_out_across_nodes_to_a_tailgator() {
    let directory = Arc::new(FakeDirectoryClient::default());

    let validators_a = Arc::new(ValidatorRegistry::new());
    validators_a.register("chat", Arc::new(LegacyAdapter(AcceptAll))).await;
    let (addr_a, state_a) = spawn_node(directory.clone(), validators_a).await;
    let (addr_b, state_b) = spawn_node(directory.clone(), Arc::new(ValidatorRegistry::new())).await;

    let node_a_http = format!("http://{addr_a}");
    let node_b_http = format!("http://{addr_b}");

    // Client 1 attaches to node A under account "foo".
    let (mut ws_a, _) = tokio_tungstenite::connect_async(format!("ws://{addr_a}/stream/?account=foo"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let conn1 = state_a.connections.all_for_account("foo").await.remove(0);
    let session1 = conn1.session.clone();
    let conn1_id = conn1.id.clone();

    // Client 2 attaches to node B under a different account, acting as the
    // tailgator of client 1's session.
    let (mut ws_b, _) = tokio_tungstenite::connect_async(format!("ws://{addr_b}/stream/?account=bar"))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let conn2 = state_b.connections.all_for_account("bar").await.remove(0);
    let conn2_id = conn2.id.clone();
    let follower_addr = format!("{node_b_http}@{conn2_id}");

    // The follower registers itself in the directory's tailgator set...
    state_a
        .sessions
        .add_tailgator("foo", &session1, &follower_addr)
        .await
        .unwrap();
    // ...and explicitly forwards itself to the already-open followee
    // connection, since a tailgator added after bootstrap would otherwise
    // be invisible to node A's in-memory `tail` until the next bootstrap
    // (Design Note §9, "Directory composite operation").
    reqwest::Client::new()
        .put(format!("{node_a_http}/primacron/broadcast"))
        .json(&json!({"id": conn1_id, "message": [follower_addr]}))
        .send()
        .await
        .unwrap();
    assert_eq!(conn1.tail().await, vec![follower_addr.clone()]);

    // Client 1 sends a validated chat message; it should reach client 2 on
    // the other node without either client knowing the other exists.
    let payload = json!({"event": "chat", "args": ["hello from node A"]}).to_string();
    ws_a.send(Message::Text(payload.clone().into())).await.unwrap();

    let Some(Ok(Message::Text(received))) = ws_b.next().await else {
        panic!("client 2 never received the fanned-out message");
    };
    let received_value: serde_json::Value = serde_json::from_str(&received).unwrap();
    assert_eq!(received_value["event"], "chat");
    assert_eq!(received_value["args"][0], "hello from node A");

    // Sanity: the message never appeared as a literal echo on node A's own
    // socket (no accidental local loopback).
    let local_echo = tokio::time::timeout(Duration::from_millis(100), ws_a.next()).await;
    assert!(local_echo.is_err(), "client 1 should not receive its own message back");
}
