//! Converters for the infill generation slot
//!
//! The engine hands the plugin a prepared infill area and the requested line
//! distance; the plugin returns the generated pattern as closed paths plus
//! open line segments.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::convert::{RequestConverter, ResponseConverter};
use crate::geometry::{Coord, Polygons};

#[derive(Debug, Serialize, Deserialize)]
struct WireRequest {
    area: Polygons,
    line_distance: Coord,
    z: Coord,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireResponse {
    polygons: Polygons,
    #[serde(default)]
    lines: Polygons,
}

/// Native result of an infill generation call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedInfill {
    /// Closed paths of the generated pattern
    pub polygons: Polygons,
    /// Open line segments of the generated pattern
    pub lines: Polygons,
}

/// Encodes the prepared infill area and print parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct InfillGenerateRequest;

impl RequestConverter for InfillGenerateRequest {
    /// (infill area, line distance, layer height z)
    type Args = (Polygons, Coord, Coord);

    fn encode(&self, args: &Self::Args) -> Result<JsonValue, serde_json::Error> {
        let (area, line_distance, z) = args;
        serde_json::to_value(WireRequest {
            area: area.clone(),
            line_distance: *line_distance,
            z: *z,
        })
    }
}

/// Decodes the generated infill pattern
#[derive(Debug, Clone, Copy, Default)]
pub struct InfillGenerateResponse;

impl ResponseConverter for InfillGenerateResponse {
    type Output = GeneratedInfill;

    fn decode(&self, payload: JsonValue) -> Result<Self::Output, serde_json::Error> {
        let wire: WireResponse = serde_json::from_value(payload)?;
        Ok(GeneratedInfill {
            polygons: wire.polygons,
            lines: wire.lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Polygon};

    #[test]
    fn test_encode_carries_parameters() {
        let area: Polygons = [[Point::new(0, 0), Point::new(2000, 0), Point::new(0, 2000)]
            .into_iter()
            .collect::<Polygon>()]
        .into_iter()
        .collect();

        let payload = InfillGenerateRequest.encode(&(area, 400, 200)).unwrap();
        assert_eq!(payload["line_distance"], 400);
        assert_eq!(payload["z"], 200);
        assert_eq!(payload["area"]["paths"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_defaults_missing_lines() {
        let payload = serde_json::json!({
            "polygons": {"paths": []}
        });

        let infill = InfillGenerateResponse.decode(payload).unwrap();
        assert!(infill.polygons.is_empty());
        assert!(infill.lines.is_empty());
    }
}
