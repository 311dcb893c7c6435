//! Converters for the polygon simplification slot
//!
//! On the wire a polygon set is one outline plus its holes; natively the
//! engine keeps a flat path list where the first path is the outline.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::convert::{RequestConverter, ResponseConverter};
use crate::geometry::{Coord, Point, Polygon, Polygons};

#[derive(Debug, Serialize, Deserialize)]
struct WirePolygon {
    outline: Vec<Point>,
    holes: Vec<Vec<Point>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireRequest {
    polygons: Vec<WirePolygon>,
    max_resolution: Coord,
    max_deviation: Coord,
    max_area_deviation: Coord,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireResponse {
    polygons: Vec<WirePolygon>,
}

fn to_wire(polygons: &Polygons) -> Vec<WirePolygon> {
    let mut paths = polygons.paths.iter();
    match paths.next() {
        Some(outline) => vec![WirePolygon {
            outline: outline.points.clone(),
            holes: paths.map(|hole| hole.points.clone()).collect(),
        }],
        None => Vec::new(),
    }
}

fn from_wire(wire: Vec<WirePolygon>) -> Polygons {
    let mut polygons = Polygons::new();
    for entry in wire {
        polygons.add(Polygon {
            points: entry.outline,
        });
        for hole in entry.holes {
            polygons.add(Polygon { points: hole });
        }
    }
    polygons
}

/// Encodes polygons plus the simplification limits
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyRequest;

impl RequestConverter for SimplifyRequest {
    /// (polygons, max_resolution, max_deviation, max_area_deviation)
    type Args = (Polygons, Coord, Coord, Coord);

    fn encode(&self, args: &Self::Args) -> Result<JsonValue, serde_json::Error> {
        let (polygons, max_resolution, max_deviation, max_area_deviation) = args;
        serde_json::to_value(WireRequest {
            polygons: to_wire(polygons),
            max_resolution: *max_resolution,
            max_deviation: *max_deviation,
            max_area_deviation: *max_area_deviation,
        })
    }
}

/// Decodes the simplified polygons
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyResponse;

impl ResponseConverter for SimplifyResponse {
    type Output = Polygons;

    fn decode(&self, payload: JsonValue) -> Result<Self::Output, serde_json::Error> {
        let wire: WireResponse = serde_json::from_value(payload)?;
        Ok(from_wire(wire.polygons))
    }
}
