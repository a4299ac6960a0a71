//! Right-triangulated irregular network refinement.
//!
//! Works on an implicit binary triangle hierarchy over a square grid whose
//! side is 2^k + 1: every triangle splits along the midpoint of its long
//! edge. A bottom-up pass accumulates each split point's approximation error
//! (taking the max over descendants, so a parent's stored error dominates its
//! subtree), then a top-down pass keeps any triangle whose split error is
//! within the bound and recurses otherwise.

use super::GridTriangulation;
use crate::decode::Heightfield;

/// A grid qualifies when it is square with side 2^k + 1 and has at least one
/// splittable triangle pair.
pub(super) fn rtin_compatible(width: u32, height: u32) -> bool {
    width == height && width >= 3 && (width - 1).is_power_of_two()
}

pub(super) fn triangulate(field: &Heightfield, max_error: f32) -> GridTriangulation {
    let size = field.width;
    let tile = size - 1;
    let errors = build_error_pyramid(field);

    let mut emitter = Emitter {
        size,
        max_error,
        errors: &errors,
        index_of: vec![0; (size * size) as usize],
        vertices: Vec::new(),
        triangles: Vec::new(),
    };
    emitter.emit(0, 0, tile, tile, tile, 0);
    emitter.emit(tile, tile, 0, 0, 0, tile);

    GridTriangulation {
        vertices: emitter.vertices,
        triangles: emitter.triangles,
    }
}

/// Per-split-point error map, visiting the hierarchy smallest-first so each
/// parent sees its children's accumulated errors.
fn build_error_pyramid(field: &Heightfield) -> Vec<f32> {
    let size = field.width;
    let tile = size - 1;
    let num_triangles = (tile as usize * tile as usize) * 2 - 2;
    let num_parents = num_triangles - (tile as usize * tile as usize);
    let samples = &field.samples;
    let mut errors = vec![0.0f32; (size * size) as usize];

    for i in (0..num_triangles).rev() {
        // walk the triangle id's bits down the hierarchy to its corners
        let mut id = i + 2;
        let (mut ax, mut ay, mut bx, mut by, mut cx, mut cy) = (0u32, 0u32, 0u32, 0u32, 0u32, 0u32);
        if id & 1 == 1 {
            bx = tile;
            by = tile;
            cx = tile;
        } else {
            ax = tile;
            ay = tile;
            cy = tile;
        }
        id >>= 1;
        while id > 1 {
            let mx = (ax + bx) / 2;
            let my = (ay + by) / 2;
            if id & 1 == 1 {
                bx = ax;
                by = ay;
                ax = cx;
                ay = cy;
            } else {
                ax = bx;
                ay = by;
                bx = cx;
                by = cy;
            }
            cx = mx;
            cy = my;
            id >>= 1;
        }

        let mx = (ax + bx) / 2;
        let my = (ay + by) / 2;
        let interpolated =
            (samples[(ay * size + ax) as usize] + samples[(by * size + bx) as usize]) * 0.5;
        let mid = (my * size + mx) as usize;
        let mid_error = (interpolated - samples[mid]).abs();
        errors[mid] = errors[mid].max(mid_error);

        if i < num_parents {
            let left = (((ay + my) / 2) * size + (ax + mx) / 2) as usize;
            let right = (((by + my) / 2) * size + (bx + mx) / 2) as usize;
            errors[mid] = errors[mid].max(errors[left]).max(errors[right]);
        }
    }

    errors
}

struct Emitter<'a> {
    size: u32,
    max_error: f32,
    errors: &'a [f32],
    /// grid slot -> vertex index + 1; 0 marks unused
    index_of: Vec<u32>,
    vertices: Vec<(u32, u32)>,
    triangles: Vec<u32>,
}

impl Emitter<'_> {
    fn vertex(&mut self, x: u32, y: u32) -> u32 {
        let slot = (y * self.size + x) as usize;
        if self.index_of[slot] == 0 {
            self.vertices.push((x, y));
            self.index_of[slot] = self.vertices.len() as u32;
        }
        self.index_of[slot] - 1
    }

    fn emit(&mut self, ax: u32, ay: u32, bx: u32, by: u32, cx: u32, cy: u32) {
        let mx = (ax + bx) / 2;
        let my = (ay + by) / 2;
        let splittable = ax.abs_diff(cx) + ay.abs_diff(cy) > 1;

        if splittable && self.errors[(my * self.size + mx) as usize] > self.max_error {
            self.emit(cx, cy, ax, ay, mx, my);
            self.emit(bx, by, cx, cy, mx, my);
        } else {
            let a = self.vertex(ax, ay);
            let b = self.vertex(bx, by);
            let c = self.vertex(cx, cy);
            self.triangles.extend_from_slice(&[a, b, c]);
        }
    }
}
