//! Minimal integer-coordinate geometry used by the polygon slots
//!
//! Coordinates are in engine-internal microns. These types exist so slot
//! converters have a native value to map from and to; the engine's own
//! geometry algorithms live elsewhere.

use serde::{Deserialize, Serialize};

/// Engine-internal coordinate, in microns
pub type Coord = i64;

/// One 2D point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

/// A closed path of points
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl FromIterator<Point> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// A set of closed paths; by convention the first path is the outline and
/// the remaining paths are holes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygons {
    pub paths: Vec<Polygon>,
}

impl Polygons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, polygon: Polygon) {
        self.paths.push(polygon);
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

impl FromIterator<Polygon> for Polygons {
    fn from_iter<I: IntoIterator<Item = Polygon>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}
