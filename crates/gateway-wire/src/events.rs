use serde::Serialize;
use serde_json::Value;

/// Internal observability events, one per channel named in the spec's
/// "Events emitted on the node instance" table. String event names from
/// the original ambient-event-bus design survive only inside the payload
/// fields that need them (`event`); routing is by enum variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    Listening {
        addr: String,
    },
    Close,
    ErrorConnect {
        account: String,
        session: String,
        reason: String,
    },
    ErrorDisconnect {
        account: String,
        session: String,
        reason: String,
    },
    ErrorInvalid {
        reason: String,
        raw: String,
        user: Option<String>,
    },
    ErrorValidation {
        event: String,
        user: String,
        raw: String,
        reason: String,
    },
    /// A Tail Fan-out delivery to one tailgator address failed (§4.8). Does
    /// not affect local delivery; the caller only observes this.
    ErrorForward {
        address: String,
        reason: String,
    },
    /// The validated-emission channel: `stream::<event>`.
    Stream {
        event: String,
        user: String,
        raw: String,
        data: Vec<Value>,
    },
}
