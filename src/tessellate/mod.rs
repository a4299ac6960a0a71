//! Error-bounded heightfield tessellation.
//!
//! Two strategies produce a grid-space triangulation: a right-triangulated
//! irregular network over 2^k+1 square grids, and a greedy Delaunay
//! refinement for everything else. Both keep the triangulated surface within
//! `max_error` meters of the source samples; this module dispatches between
//! them, absorbs degenerate inputs, and maps the result into tile bounds.

mod greedy;
mod rtin;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::decode::Heightfield;
use crate::error::{TerrainError, TerrainResult};
use crate::mesh::{Indices, TerrainMesh, TerrainVertex};
use crate::tiling::TileBounds;

/// Tessellation strategy selection. A closed set: the supported algorithms
/// are few and fixed, so there is no registry to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TesselatorKind {
    /// Rtin when the grid qualifies, greedy otherwise.
    #[default]
    Auto,
    /// Right-triangle refinement hierarchy; square 2^k+1 grids only.
    Rtin,
    /// Greedy Delaunay refinement; any grid shape.
    Greedy,
}

/// Triangulation in grid coordinates, shared output of both strategies.
pub(crate) struct GridTriangulation {
    /// grid (x, y) per vertex
    pub vertices: Vec<(u32, u32)>,
    /// vertex-index triples
    pub triangles: Vec<u32>,
}

/// Tessellate a heightfield into a mesh whose surface deviates from the
/// source samples by at most `max_error` meters, mapped into `bounds` with
/// grid row 0 along the bounds' max-Y edge.
pub fn tessellate(
    field: &Heightfield,
    max_error: f32,
    kind: TesselatorKind,
    bounds: &TileBounds,
) -> TerrainResult<TerrainMesh> {
    if !(max_error > 0.0) || !max_error.is_finite() {
        return Err(TerrainError::tessellation(format!(
            "max_error must be a positive finite number, got {}",
            max_error
        )));
    }

    if field.is_empty() {
        return Ok(TerrainMesh::empty());
    }

    // grids too thin to triangulate, and uniform fields, collapse to a quad
    let (lo, hi) = field.min_max().unwrap_or((0.0, 0.0));
    if field.width < 2 || field.height < 2 || lo == hi {
        return Ok(TerrainMesh::flat_quad(bounds, (lo + hi) * 0.5));
    }

    let grid = match kind {
        TesselatorKind::Rtin => {
            if !rtin::rtin_compatible(field.width, field.height) {
                return Err(TerrainError::tessellation(format!(
                    "rtin requires a square 2^k+1 grid, got {}x{}",
                    field.width, field.height
                )));
            }
            rtin::triangulate(field, max_error)
        }
        TesselatorKind::Greedy => greedy::triangulate(field, max_error),
        TesselatorKind::Auto => {
            if rtin::rtin_compatible(field.width, field.height) {
                rtin::triangulate(field, max_error)
            } else {
                greedy::triangulate(field, max_error)
            }
        }
    };

    Ok(assemble(field, &grid, bounds))
}

/// Map grid-space vertices into the tile bounds and normalize winding to
/// CCW in world XY.
fn assemble(field: &Heightfield, grid: &GridTriangulation, bounds: &TileBounds) -> TerrainMesh {
    let size = bounds.size();
    let step_u = 1.0 / (field.width - 1) as f64;
    let step_v = 1.0 / (field.height - 1) as f64;

    let vertices: Vec<TerrainVertex> = grid
        .vertices
        .iter()
        .map(|&(gx, gy)| {
            let u = gx as f64 * step_u;
            let v = gy as f64 * step_v;
            let world = DVec2::new(
                bounds.min.x + u * size.x,
                bounds.max.y - v * size.y,
            );
            TerrainVertex {
                position: [world.x as f32, world.y as f32, field.sample(gx, gy)],
                uv: [u as f32, v as f32],
            }
        })
        .collect();

    let mut indices = Vec::with_capacity(grid.triangles.len());
    for tri in grid.triangles.chunks_exact(3) {
        let (ia, ib, ic) = (tri[0], tri[1], tri[2]);
        let a = vertices[ia as usize].position;
        let b = vertices[ib as usize].position;
        let c = vertices[ic as usize].position;
        let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
        if cross >= 0.0 {
            indices.extend_from_slice(&[ia, ib, ic]);
        } else {
            indices.extend_from_slice(&[ia, ic, ib]);
        }
    }

    TerrainMesh::new(vertices, Indices::from_u32(indices, grid.vertices.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(w: f64, h: f64) -> TileBounds {
        TileBounds::new(DVec2::new(0.0, 0.0), DVec2::new(w, h))
    }

    fn field(w: u32, h: u32, f: impl Fn(u32, u32) -> f32) -> Heightfield {
        let f = &f;
        let samples = (0..h).flat_map(|y| (0..w).map(move |x| f(x, y))).collect();
        Heightfield::new(w, h, samples)
    }

    #[test]
    fn empty_field_yields_empty_mesh() {
        let hf = Heightfield::new(0, 0, vec![]);
        let mesh = tessellate(&hf, 1.0, TesselatorKind::Auto, &bounds(10.0, 10.0)).unwrap();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn single_sample_yields_flat_quad_at_its_height() {
        let hf = Heightfield::new(1, 1, vec![12.5]);
        let mesh = tessellate(&hf, 1.0, TesselatorKind::Auto, &bounds(4.0, 4.0)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounding_box.min.z, 12.5);
        assert_eq!(mesh.bounding_box.max.z, 12.5);
    }

    #[test]
    fn uniform_field_yields_flat_quad() {
        let hf = field(16, 16, |_, _| -3.0);
        let mesh = tessellate(&hf, 0.1, TesselatorKind::Auto, &bounds(8.0, 8.0)).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.bounding_box.min.z, -3.0);
    }

    #[test]
    fn explicit_rtin_rejects_incompatible_grids() {
        let hf = field(10, 10, |x, _| x as f32);
        let err = tessellate(&hf, 1.0, TesselatorKind::Rtin, &bounds(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, TerrainError::Tessellation(_)));
    }

    #[test]
    fn auto_falls_back_to_greedy_for_odd_shapes() {
        let hf = field(10, 7, |x, y| (x + y) as f32);
        let mesh = tessellate(&hf, 0.5, TesselatorKind::Auto, &bounds(9.0, 6.0)).unwrap();
        assert!(mesh.triangle_count() >= 2);
    }

    #[test]
    fn vertices_land_inside_bounds_with_row_zero_at_max_y() {
        let hf = field(5, 5, |x, y| (x * y) as f32);
        let b = TileBounds::new(DVec2::new(-50.0, -30.0), DVec2::new(50.0, 30.0));
        let mesh = tessellate(&hf, 0.01, TesselatorKind::Auto, &b).unwrap();

        for v in &mesh.vertices {
            assert!(v.position[0] >= -50.0 - 1e-3 && v.position[0] <= 50.0 + 1e-3);
            assert!(v.position[1] >= -30.0 - 1e-3 && v.position[1] <= 30.0 + 1e-3);
        }
        // the uv origin (grid 0,0) maps to the north-west corner
        let origin = mesh
            .vertices
            .iter()
            .find(|v| v.uv == [0.0, 0.0])
            .expect("corner vertex present");
        assert_eq!(origin.position[0], -50.0);
        assert_eq!(origin.position[1], 30.0);
    }

    #[test]
    fn winding_is_ccw_after_mapping() {
        let hf = field(9, 9, |x, y| ((x * 7 + y * 3) % 5) as f32);
        let mesh = tessellate(&hf, 0.5, TesselatorKind::Auto, &bounds(10.0, 10.0)).unwrap();
        assert!(mesh.triangle_count() > 0);
        for t in 0..mesh.triangle_count() {
            let a = mesh.vertices[mesh.indices.get(t * 3)].position;
            let b = mesh.vertices[mesh.indices.get(t * 3 + 1)].position;
            let c = mesh.vertices[mesh.indices.get(t * 3 + 2)].position;
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross >= 0.0, "triangle {} is CW", t);
        }
    }

    #[test]
    fn rejects_non_positive_max_error() {
        let hf = field(3, 3, |x, _| x as f32);
        assert!(tessellate(&hf, 0.0, TesselatorKind::Auto, &bounds(1.0, 1.0)).is_err());
        assert!(tessellate(&hf, -1.0, TesselatorKind::Auto, &bounds(1.0, 1.0)).is_err());
        assert!(tessellate(&hf, f32::NAN, TesselatorKind::Auto, &bounds(1.0, 1.0)).is_err());
    }

    #[test]
    fn tesselator_kind_parses_from_config_strings() {
        assert_eq!(
            serde_json::from_str::<TesselatorKind>("\"auto\"").unwrap(),
            TesselatorKind::Auto
        );
        assert_eq!(
            serde_json::from_str::<TesselatorKind>("\"rtin\"").unwrap(),
            TesselatorKind::Rtin
        );
        assert_eq!(
            serde_json::from_str::<TesselatorKind>("\"greedy\"").unwrap(),
            TesselatorKind::Greedy
        );
    }
}
