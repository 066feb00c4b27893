use serde_json::Value;

/// Pluggable payload codec (§6's `encode`/`decode` options). The core only
/// needs to get from "raw client bytes" to a `serde_json::Value` and back;
/// the default (and only implementation shipped here) is plain JSON, but
/// the seam exists so a node can be configured with a different wire
/// format without touching the validation pipeline or connection manager.
pub trait Codec: Send + Sync {
    fn decode(&self, raw: &str) -> Result<Value, CodecError>;
    fn encode(&self, value: &Value) -> Result<String, CodecError>;
}

#[derive(Debug, thiserror::Error)]
#[error("codec failure: {0}")]
pub struct CodecError(#[from] pub serde_json::Error);

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn decode(&self, raw: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }

    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }
}
