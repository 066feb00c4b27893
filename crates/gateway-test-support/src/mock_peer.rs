// MockPeerServer: a minimal HTTP peer standing in for another cluster node,
// used to test the Peer Broadcaster's outbound PUT calls without a real
// gateway node on the other end. Mirrors rt-test-utils::MockWsServer's
// shape: bind to a random port, run the accept loop in a background task,
// expose what the caller needs to assert against.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::put;
use axum::{Json, Router};
use serde_json::Value;

#[derive(Clone, Default)]
struct Received(Arc<Mutex<Vec<Value>>>);

/// The configurable response a `MockPeerServer` replies with to every
/// broadcast PUT it receives.
#[derive(Clone)]
pub struct ScriptedResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl Default for ScriptedResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: serde_json::json!({"status": 200, "type": "sending", "description": "ok"}),
        }
    }
}

pub struct MockPeerServer {
    addr: SocketAddr,
    received: Received,
    _task: tokio::task::JoinHandle<()>,
}

impl MockPeerServer {
    pub async fn start(broadcast_path: &str, response: ScriptedResponse) -> Self {
        let received = Received::default();
        let state = (received.clone(), response);

        let router = Router::new()
            .route(
                broadcast_path,
                put(
                    |State((received, response)): State<(Received, ScriptedResponse)>,
                     Json(body): Json<Value>| async move {
                        received.0.lock().unwrap().push(body);
                        (response.status, Json(response.body.clone()))
                    },
                ),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock peer listener");
        let addr = listener.local_addr().expect("mock peer local addr");

        let task = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            addr,
            received,
            _task: task,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn received_bodies(&self) -> Vec<Value> {
        self.received.0.lock().unwrap().clone()
    }
}
