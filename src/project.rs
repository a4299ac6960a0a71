//! Tile bounds projection.
//!
//! Each tile gets its own web-mercator projection re-centered at the tile
//! centroid, so mesh vertex coordinates stay small near the tile origin
//! instead of carrying the magnitude of a global projected frame.

use glam::DVec2;
use std::f64::consts::PI;

use crate::tiling::{GeoBounds, TileBounds};

const TILE_SIZE: f64 = 512.0;

/// Spherical web-mercator projection centered on a reference point.
///
/// World size scales with zoom (`512 * 2^zoom` projected units across the
/// full longitude range); the y axis points north.
#[derive(Debug, Clone, Copy)]
pub struct LocalMercator {
    world_size: f64,
    center: DVec2,
}

impl LocalMercator {
    pub fn new(center_lon: f64, center_lat: f64, zoom: u32) -> Self {
        let world_size = TILE_SIZE * (1u64 << zoom) as f64;
        let center = Self::raw(center_lon, center_lat, world_size);
        Self { world_size, center }
    }

    fn raw(lon: f64, lat: f64, world_size: f64) -> DVec2 {
        let x = (lon / 360.0 + 0.5) * world_size;
        let merc = (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        let y = (0.5 + merc / (2.0 * PI)) * world_size;
        DVec2::new(x, y)
    }

    /// Project a lon/lat pair into local planar coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        Self::raw(lon, lat, self.world_size) - self.center
    }

    /// Inverse of [`project`](Self::project), exact up to float tolerance.
    pub fn unproject(&self, point: DVec2) -> (f64, f64) {
        let p = point + self.center;
        let lon = (p.x / self.world_size - 0.5) * 360.0;
        let merc = (p.y / self.world_size - 0.5) * 2.0 * PI;
        let lat = (2.0 * merc.exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

/// Derive a tile's planar bounds by projecting its geographic box's SW and
/// NE corners through a mercator projection centered at the box midpoint.
pub fn project_tile_bounds(geo: &GeoBounds, zoom: u32) -> TileBounds {
    let (lon, lat) = geo.center();
    let projection = LocalMercator::new(lon, lat, zoom);
    let sw = projection.project(geo.west, geo.south);
    let ne = projection.project(geo.east, geo.north);
    TileBounds::new(sw, ne)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiling::TileKey;

    #[test]
    fn center_projects_to_origin() {
        let m = LocalMercator::new(138.72, 35.36, 10);
        let p = m.project(138.72, 35.36);
        assert!(p.x.abs() < 1e-9 && p.y.abs() < 1e-9);
    }

    #[test]
    fn projection_round_trips() {
        let m = LocalMercator::new(11.5, 47.2, 12);
        for &(lon, lat) in &[(11.3, 47.0), (11.5, 47.2), (11.9, 47.5), (-0.1, -35.0)] {
            let p = m.project(lon, lat);
            let (lon2, lat2) = m.unproject(p);
            assert!((lon2 - lon).abs() < 1e-9, "lon {} -> {}", lon, lon2);
            assert!((lat2 - lat).abs() < 1e-9, "lat {} -> {}", lat, lat2);
        }
    }

    #[test]
    fn tile_bounds_are_centered_and_ordered() {
        let key = TileKey::new(543, 352, 10);
        let geo = key.geo_bounds();
        let bounds = project_tile_bounds(&geo, key.zoom);

        assert!(bounds.min.x < bounds.max.x);
        assert!(bounds.min.y < bounds.max.y);
        // centroid-centered projection puts the box center near the origin
        let c = bounds.center();
        assert!(c.x.abs() < 1e-6 && c.y.abs() < 1.0);
        // a zoom-10 tile is ~512 projected units across
        assert!((bounds.size().x - TILE_SIZE).abs() < 1.0);
    }

    #[test]
    fn corners_recover_geographic_coordinates() {
        let geo = TileKey::new(17, 11, 5).geo_bounds();
        let (lon, lat) = geo.center();
        let m = LocalMercator::new(lon, lat, 5);
        let bounds = project_tile_bounds(&geo, 5);

        let (west, south) = m.unproject(bounds.min);
        let (east, north) = m.unproject(bounds.max);
        assert!((west - geo.west).abs() < 1e-9);
        assert!((south - geo.south).abs() < 1e-9);
        assert!((east - geo.east).abs() < 1e-9);
        assert!((north - geo.north).abs() < 1e-9);
    }
}
