use std::sync::Arc;

use gateway_directory::SessionDirectory;
use gateway_wire::GatewayEvent;
use tokio::sync::broadcast;

use crate::connection::ConnectionManager;
use crate::peer_broadcast::PeerBroadcaster;
use crate::tail_fanout::TailFanout;
use crate::validation::ValidatorRegistry;

/// Shared state handed to every axum handler, mirroring the teacher's
/// `AppState` (clone of `Arc`-wrapped registries plus a broadcast channel
/// standing in for its `dashboard_tx`).
#[derive(Clone)]
pub struct AppState {
    pub connections: Arc<ConnectionManager>,
    pub sessions: SessionDirectory,
    pub validators: Arc<ValidatorRegistry>,
    pub fanout: TailFanout,
    pub node_url: String,
    pub events_tx: broadcast::Sender<GatewayEvent>,
}

impl AppState {
    pub fn new(
        connections: Arc<ConnectionManager>,
        sessions: SessionDirectory,
        validators: Arc<ValidatorRegistry>,
        http: reqwest::Client,
        broadcast_path: String,
        node_url: String,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(1024);
        let broadcaster = PeerBroadcaster::new(http, broadcast_path);
        let fanout = TailFanout::new(connections.clone(), broadcaster);
        Self {
            connections,
            sessions,
            validators,
            fanout,
            node_url,
            events_tx,
        }
    }

    /// Emits an observability event to any subscribed SSE clients. Dropping
    /// the event when nobody is listening is expected and not an error.
    pub fn emit(&self, event: GatewayEvent) {
        let _ = self.events_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.events_tx.subscribe()
    }
}
