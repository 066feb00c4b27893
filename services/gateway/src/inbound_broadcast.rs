use std::sync::OnceLock;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use gateway_wire::{BroadcastEnvelope, BroadcastOutcome, GatewayEvent};
use tracing::warn;

use crate::state::AppState;

const POWERED_BY: HeaderValue = HeaderValue::from_static(crate::POWERED_BY_VALUE);

/// Pre-serialized `{status, type, description}` bodies, one per outcome,
/// built once at startup rather than on every request (§4.4: "cached once
/// at startup").
fn cached_body(outcome: BroadcastOutcome) -> &'static str {
    static CACHE: OnceLock<[String; 5]> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        [
            serde_json::to_string(&BroadcastOutcome::Sending.body()).unwrap(),
            serde_json::to_string(&BroadcastOutcome::Broken.body()).unwrap(),
            serde_json::to_string(&BroadcastOutcome::Invalid.body()).unwrap(),
            serde_json::to_string(&BroadcastOutcome::UnknownSocket.body()).unwrap(),
            serde_json::to_string(&BroadcastOutcome::BadRequest.body()).unwrap(),
        ]
    });
    match outcome {
        BroadcastOutcome::Sending => &cache[0],
        BroadcastOutcome::Broken => &cache[1],
        BroadcastOutcome::Invalid => &cache[2],
        BroadcastOutcome::UnknownSocket => &cache[3],
        BroadcastOutcome::BadRequest => &cache[4],
    }
}

fn respond(outcome: BroadcastOutcome) -> Response {
    let status = StatusCode::from_u16(outcome.status()).unwrap_or(StatusCode::BAD_REQUEST);
    let mut response = (status, cached_body(outcome).to_owned()).into_response();
    response
        .headers_mut()
        .insert("x-powered-by", POWERED_BY.clone());
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

/// `PUT <broadcast_path>` (§4.4). Body is read as UTF-8 text up front so
/// decode failures (step 1) can be distinguished from shape failures
/// (steps 2-3) before any JSON value exists.
pub async fn handle(State(state): State<AppState>, body: String) -> Response {
    let envelope = match BroadcastEnvelope::parse(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            let outcome = if err.is_decode_failure() {
                BroadcastOutcome::Broken
            } else {
                BroadcastOutcome::Invalid
            };
            state.emit(GatewayEvent::ErrorInvalid {
                reason: err.to_string(),
                raw: body,
                user: None,
            });
            return respond(outcome);
        }
    };

    let Some(conn) = state.connections.get(&envelope.id).await else {
        return respond(BroadcastOutcome::UnknownSocket);
    };

    match &envelope.message {
        serde_json::Value::String(text) => {
            conn.send_raw(text.clone());
        }
        serde_json::Value::Array(members) => {
            let addrs: Vec<String> = members
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect();
            conn.append_tail(&addrs).await;
        }
        other => {
            if !state.connections.deliver_message(&envelope.id, other).await {
                warn!(id = %envelope.id, "failed to encode generic broadcast message");
            }
        }
    }

    respond(BroadcastOutcome::Sending)
}
