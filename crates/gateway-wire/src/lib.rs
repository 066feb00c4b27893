// gateway-wire: wire types shared between cluster nodes and test harnesses.
//
// Everything here is a plain data type plus the parsing rules the spec pins
// down exactly (e.g. "top-level must be an object, not array/primitive").
// No I/O, no tokio, no application logic.

pub mod envelope;
pub mod error_codes;
pub mod events;

pub use envelope::{BroadcastEnvelope, EnvelopeError};
pub use error_codes::{BroadcastOutcome, BroadcastResponseBody};
pub use events::GatewayEvent;
