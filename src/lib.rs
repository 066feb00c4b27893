//! Root package for cross-node integration tests (`tests/integration/*.rs`).
//!
//! The actual gateway lives in `services/gateway`; this crate has no
//! runtime code of its own and exists so that multi-node cluster behavior
//! can be exercised against real, independently-listening `gateway` nodes
//! sharing one directory.
