use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::connection::ConnectionManager;
use crate::peer_broadcast::PeerBroadcaster;

/// After a successful validation, delivers the raw payload to every
/// tailgator on the originating connection (§4.8). Errors are logged and
/// observed via the caller's event channel but never affect local
/// delivery.
#[derive(Clone)]
pub struct TailFanout {
    connections: Arc<ConnectionManager>,
    broadcaster: PeerBroadcaster,
}

#[derive(Debug, Clone)]
pub struct TailFanoutFailure {
    pub address: String,
    pub reason: String,
}

impl TailFanout {
    pub fn new(connections: Arc<ConnectionManager>, broadcaster: PeerBroadcaster) -> Self {
        Self {
            connections,
            broadcaster,
        }
    }

    /// Fans `raw` out to every tailgator of local connection `origin_id`,
    /// returning the addresses that failed (for observability -- the
    /// caller decides how to surface them as `error::*` events).
    pub async fn fan_out(&self, origin_id: &str, raw: &Value) -> Vec<TailFanoutFailure> {
        let Some(conn) = self.connections.get(origin_id).await else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        for address in conn.tail().await {
            if address.is_empty() {
                continue;
            }
            let Some((peer_url, peer_conn_id)) = address.split_once('@') else {
                failures.push(TailFanoutFailure {
                    address: address.clone(),
                    reason: "address missing '@' separator".to_owned(),
                });
                continue;
            };

            if let Err(err) = self.broadcaster.send(peer_url, peer_conn_id, raw).await {
                warn!(address = %address, error = %err, "tail fan-out delivery failed");
                failures.push(TailFanoutFailure {
                    address: address.clone(),
                    reason: err.to_string(),
                });
            }
        }
        failures
    }
}
