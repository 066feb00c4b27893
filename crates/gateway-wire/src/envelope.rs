use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The inter-node broadcast envelope: `{"id": "...", "message": <any>}`.
///
/// `message`'s runtime type drives dispatch on the receiving node (string ->
/// pipe event, array -> tail event, anything else -> generic message event);
/// callers inspect `message` themselves rather than this type pre-branching,
/// since that decision belongs to the inbound broadcast handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    pub id: String,
    pub message: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("top-level value is not a JSON object")]
    NotAnObject,
    #[error("missing required key `{0}`")]
    MissingKey(&'static str),
    #[error("`id` must be a string")]
    IdNotString,
}

impl EnvelopeError {
    /// True for failures that occurred before a JSON value could be
    /// produced at all (distinct from a well-formed-but-wrong-shaped value).
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, EnvelopeError::Decode(_))
    }
}

impl BroadcastEnvelope {
    /// Parse a raw request body into an envelope, distinguishing a pure
    /// JSON decode failure (step 1) from a well-decoded but wrong-shaped
    /// value (steps 2-3), per the inbound broadcast handler's validation
    /// order.
    pub fn parse(raw: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(raw)?;
        let obj = value.as_object().ok_or(EnvelopeError::NotAnObject)?;
        let id = obj.get("id").ok_or(EnvelopeError::MissingKey("id"))?;
        let message = obj
            .get("message")
            .ok_or(EnvelopeError::MissingKey("message"))?
            .clone();
        let id = id.as_str().ok_or(EnvelopeError::IdNotString)?.to_owned();
        Ok(Self { id, message })
    }
}
