//! Converters for the g-code postprocessing slot

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::convert::{RequestConverter, ResponseConverter};

#[derive(Debug, Serialize, Deserialize)]
struct WireGcode {
    gcode_word: String,
}

/// Encodes a g-code chunk for rewriting
#[derive(Debug, Clone, Copy, Default)]
pub struct PostprocessRequest;

impl RequestConverter for PostprocessRequest {
    type Args = String;

    fn encode(&self, gcode: &Self::Args) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(WireGcode {
            gcode_word: gcode.clone(),
        })
    }
}

/// Decodes the rewritten g-code chunk
#[derive(Debug, Clone, Copy, Default)]
pub struct PostprocessResponse;

impl ResponseConverter for PostprocessResponse {
    type Output = String;

    fn decode(&self, payload: JsonValue) -> Result<Self::Output, serde_json::Error> {
        let wire: WireGcode = serde_json::from_value(payload)?;
        Ok(wire.gcode_word)
    }
}
