//! Quad-tree tile addressing and planar tile bounds.

use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Slippy-map tile address in a quad-tree tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
}

impl TileKey {
    /// Synthetic whole-dataset key used by single-mesh loads.
    pub const WHOLE: TileKey = TileKey { x: 0, y: 0, zoom: 0 };

    pub fn new(x: u32, y: u32, zoom: u32) -> Self {
        Self { x, y, zoom }
    }

    /// Parent tile at the next lower zoom.
    pub fn parent(self) -> Option<TileKey> {
        if self.zoom == 0 {
            None
        } else {
            Some(TileKey::new(self.x / 2, self.y / 2, self.zoom - 1))
        }
    }

    /// The four child tiles at the next higher zoom.
    pub fn children(self) -> [TileKey; 4] {
        let zoom = self.zoom + 1;
        let x = self.x * 2;
        let y = self.y * 2;
        [
            TileKey::new(x, y, zoom),
            TileKey::new(x + 1, y, zoom),
            TileKey::new(x, y + 1, zoom),
            TileKey::new(x + 1, y + 1, zoom),
        ]
    }

    /// Geographic bounding box of this tile in degrees.
    pub fn geo_bounds(self) -> GeoBounds {
        let n = (1u64 << self.zoom) as f64;
        let lon = |x: f64| x / n * 360.0 - 180.0;
        let lat = |y: f64| {
            let t = PI * (1.0 - 2.0 * y / n);
            t.sinh().atan().to_degrees()
        };
        GeoBounds {
            west: lon(self.x as f64),
            south: lat((self.y + 1) as f64),
            east: lon((self.x + 1) as f64),
            north: lat(self.y as f64),
        }
    }
}

/// Geographic box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    /// Longitude/latitude midpoint.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.west + self.east) * 0.5,
            (self.south + self.north) * 0.5,
        )
    }
}

/// Spatial bounds for a tile in projected planar coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl TileBounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    pub fn from_array(b: [f64; 4]) -> Self {
        Self::new(DVec2::new(b[0], b[1]), DVec2::new(b[2], b[3]))
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn contains_point(&self, point: DVec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    pub fn intersects(&self, other: &TileBounds) -> bool {
        self.max.x >= other.min.x
            && self.min.x <= other.max.x
            && self.max.y >= other.min.y
            && self.min.y <= other.max.y
    }
}
