use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PeerBroadcastError {
    #[error("peer responded with status {status}: {body:?}")]
    Failed {
        status: u16,
        body: Option<Value>,
    },
    #[error("transport failure reaching peer: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Performs node-to-node message delivery as an HTTP PUT to a peer's
/// broadcast endpoint (§4.3). No retries at this layer -- the caller (Tail
/// Fan-out, or an application-initiated forward) decides whether to retry.
#[derive(Clone)]
pub struct PeerBroadcaster {
    http: reqwest::Client,
    broadcast_path: String,
}

impl PeerBroadcaster {
    pub fn new(http: reqwest::Client, broadcast_path: impl Into<String>) -> Self {
        Self {
            http,
            broadcast_path: broadcast_path.into(),
        }
    }

    pub async fn send(
        &self,
        peer_url: &str,
        conn_id: &str,
        message: &Value,
    ) -> Result<Value, PeerBroadcastError> {
        let url = format!("{}{}", peer_url, self.broadcast_path);
        let response = self
            .http
            .put(url)
            .json(&serde_json::json!({ "id": conn_id, "message": message }))
            .send()
            .await?;

        let status = response.status();
        let body: Option<Value> = response.json().await.ok();

        if status.as_u16() == 200 {
            Ok(body.unwrap_or(Value::Null))
        } else {
            Err(PeerBroadcastError::Failed {
                status: status.as_u16(),
                body,
            })
        }
    }
}
