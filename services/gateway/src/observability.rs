use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use gateway_wire::GatewayEvent;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::state::AppState;

fn event_type(event: &GatewayEvent) -> &'static str {
    match event {
        GatewayEvent::Listening { .. } => "listening",
        GatewayEvent::Close => "close",
        GatewayEvent::ErrorConnect { .. } => "error_connect",
        GatewayEvent::ErrorDisconnect { .. } => "error_disconnect",
        GatewayEvent::ErrorInvalid { .. } => "error_invalid",
        GatewayEvent::ErrorValidation { .. } => "error_validation",
        GatewayEvent::ErrorForward { .. } => "error_forward",
        GatewayEvent::Stream { .. } => "stream",
    }
}

/// SSE feed of this node's `GatewayEvent` stream, for dashboards and
/// operational tooling. Not part of the spec's external interface table --
/// an ambient observability surface in the teacher's idiom.
pub async fn stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let events = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => Some(Ok(Event::default().event(event_type(&event)).data(json))),
            Err(_) => None,
        },
        Err(_) => None,
    });

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
