use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use gateway_wire::GatewayEvent;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bootstrap::{bootstrap, RandomSessionId};
use crate::state::AppState;
use crate::validation::{ValidationOutcome, ValidationRequest};

/// `GET|WS <endpoint>?account=...` (§4.9, §6). Per §4.9 branch 1, this route
/// only hands off to the transport when `account` is present; a request
/// that matches the path but is missing `account` falls through to the
/// same treatment as a WS upgrade on any other path (§4.9 branch 2): closed
/// without a response body, no session bootstrapped.
pub async fn handle(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(account) = query.get("account").cloned() else {
        return ws.on_upgrade(|socket| async move { drop(socket) });
    };
    ws.on_upgrade(move |socket| run(socket, state, account))
}

async fn run(socket: WebSocket, state: AppState, account: String) {
    // Bootstrap is deferred one scheduler tick past the upgrade callback so
    // that, were this transport ever swapped for one whose query state is
    // populated asynchronously, the ordering constraint in §5 still holds.
    tokio::task::yield_now().await;

    let conn_id = Uuid::new_v4().to_string();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    let bootstrapped = match bootstrap(&state, &RandomSessionId, &account, &conn_id).await {
        Ok(b) => b,
        Err(err) => {
            state.emit(GatewayEvent::ErrorConnect {
                account: account.clone(),
                session: String::new(),
                reason: err.to_string(),
            });
            warn!(account = %account, error = %err, "session bootstrap failed");
            return;
        }
    };

    let conn = state
        .connections
        .open(
            conn_id.clone(),
            account.clone(),
            bootstrapped.session.clone(),
            outbound_tx,
        )
        .await;
    conn.append_tail(&bootstrapped.tailgators).await;

    info!(account = %account, session = %bootstrapped.session, conn_id = %conn_id, "connection bootstrapped");

    let (mut sink, mut stream) = socket.split();

    let relay = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_inbound(&state, &conn_id, &account, text.to_string()).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(conn_id = %conn_id, error = %err, "websocket receive error");
                break;
            }
        }
    }

    relay.abort();
    if let Some(closed) = state.connections.close(&conn_id).await {
        if let Err(err) = state
            .sessions
            .unregister(&closed.account, &closed.session, &closed.id)
            .await
        {
            state.emit(GatewayEvent::ErrorDisconnect {
                account: closed.account.clone(),
                session: closed.session.clone(),
                reason: err.to_string(),
            });
        }
    }
    info!(conn_id = %conn_id, "connection closed");
}

/// Inbound client message handling (§4.5 steps 1-5).
async fn handle_inbound(state: &AppState, conn_id: &str, account: &str, raw: String) {
    let decoded = match state.connections.codec().decode(&raw) {
        Ok(value) => value,
        Err(err) => {
            state.emit(GatewayEvent::ErrorInvalid {
                reason: err.to_string(),
                raw,
                user: Some(conn_id.to_owned()),
            });
            return;
        }
    };

    let Some(obj) = decoded.as_object() else {
        state.emit(GatewayEvent::ErrorInvalid {
            reason: "decoded message is not an object".to_owned(),
            raw,
            user: Some(conn_id.to_owned()),
        });
        return;
    };

    let (event, args) = if let Some(event) = obj.get("event").and_then(Value::as_str) {
        let args = obj
            .get("args")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        (event.to_owned(), args)
    } else {
        ("message".to_owned(), vec![decoded.clone()])
    };

    if !state.validators.has_validator(&event).await {
        state.emit(GatewayEvent::ErrorValidation {
            event,
            user: conn_id.to_owned(),
            raw,
            reason: "Validator missing".to_owned(),
        });
        return;
    }

    let request = ValidationRequest {
        event: event.clone(),
        args,
        user: conn_id.to_owned(),
        raw: raw.clone(),
    };

    match state.validators.invoke(request).await {
        Some(ValidationOutcome::Accepted { data }) => {
            state.emit(GatewayEvent::Stream {
                event,
                user: conn_id.to_owned(),
                raw: raw.clone(),
                data,
            });
            let message = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            let failures = state.fanout.fan_out(conn_id, &message).await;
            for failure in failures {
                warn!(account = %account, address = %failure.address, reason = %failure.reason, "tail fan-out failed");
                state.emit(GatewayEvent::ErrorForward {
                    address: failure.address,
                    reason: failure.reason,
                });
            }
        }
        Some(ValidationOutcome::Rejected { reason }) => {
            state.emit(GatewayEvent::ErrorValidation {
                event,
                user: conn_id.to_owned(),
                raw,
                reason,
            });
        }
        None => unreachable!("has_validator already confirmed a registration exists"),
    }
}
