//! Converter traits mapping native call data to slot wire payloads
//!
//! Each slot supplies one converter pair. Converters are stateless and
//! deterministic: a given native input always encodes to the same wire form,
//! which is what makes slot behavior testable against a reference
//! computation.

use serde_json::Value as JsonValue;

/// Maps native call arguments to the slot's wire request payload
pub trait RequestConverter: Send + Sync {
    /// Native argument bundle for one call against this slot
    type Args;

    fn encode(&self, args: &Self::Args) -> Result<JsonValue, serde_json::Error>;
}

/// Maps the slot's wire response payload back to a native value
pub trait ResponseConverter: Send + Sync {
    /// Native value produced by one call against this slot
    type Output;

    fn decode(&self, payload: JsonValue) -> Result<Self::Output, serde_json::Error>;
}
