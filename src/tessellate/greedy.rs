//! Greedy Delaunay refinement.
//!
//! Starts from two triangles over the grid corners and repeatedly inserts
//! the sample with the worst vertical deviation into the triangulation,
//! re-legalizing affected edges, until every triangle's scanned deviation is
//! within the bound. Accepts any grid shape of at least 2x2.
//!
//! Triangles live in a flat half-edge array; freed slots are reused in place
//! so every slot is live at all times. A manual binary heap keyed by each
//! triangle's scan error picks the next split.

use super::GridTriangulation;
use crate::decode::Heightfield;

pub(super) fn triangulate(field: &Heightfield, max_error: f32) -> GridTriangulation {
    let mut refiner = Refiner::new(field);
    refiner.run(max_error);
    refiner.into_triangulation()
}

/// Twice the signed area of (a, b, c); positive for the winding every
/// triangle in the refiner maintains.
#[inline]
fn orient(ax: i64, ay: i64, bx: i64, by: i64, cx: i64, cy: i64) -> i64 {
    (bx - cx) * (ay - cy) - (by - cy) * (ax - cx)
}

/// True when `p` lies strictly inside the circumcircle of (a, b, c).
fn in_circle(a: (u32, u32), b: (u32, u32), c: (u32, u32), p: (u32, u32)) -> bool {
    let dx = a.0 as f64 - p.0 as f64;
    let dy = a.1 as f64 - p.1 as f64;
    let ex = b.0 as f64 - p.0 as f64;
    let ey = b.1 as f64 - p.1 as f64;
    let fx = c.0 as f64 - p.0 as f64;
    let fy = c.1 as f64 - p.1 as f64;

    let ap = dx * dx + dy * dy;
    let bp = ex * ex + ey * ey;
    let cp = fx * fx + fy * fy;

    dx * (ey * cp - bp * fy) - dy * (ex * cp - bp * fx) + ap * (ex * fy - ey * fx) < 0.0
}

struct Refiner<'a> {
    field: &'a Heightfield,
    coords: Vec<(u32, u32)>,
    /// vertex ids, three per triangle; slots are reused on split/flip
    triangles: Vec<u32>,
    /// opposite half-edge per edge, -1 on the hull boundary
    halfedges: Vec<i32>,
    /// per triangle: the sample with the worst deviation
    candidates: Vec<(u32, u32)>,
    /// per triangle: sum of squared deviations, the heap tiebreak
    rms: Vec<f64>,
    /// max-heap of (scan error, triangle)
    queue: Vec<(f32, u32)>,
    /// triangle -> heap slot, -1 when not queued
    queue_index: Vec<i32>,
    /// triangles awaiting a rasterization scan
    pending: Vec<u32>,
}

impl<'a> Refiner<'a> {
    fn new(field: &'a Heightfield) -> Self {
        let mut refiner = Self {
            field,
            coords: Vec::new(),
            triangles: Vec::new(),
            halfedges: Vec::new(),
            candidates: Vec::new(),
            rms: Vec::new(),
            queue: Vec::new(),
            queue_index: Vec::new(),
            pending: Vec::new(),
        };

        let x1 = field.width - 1;
        let y1 = field.height - 1;
        let p0 = refiner.add_point(0, 0);
        let p1 = refiner.add_point(x1, 0);
        let p2 = refiner.add_point(0, y1);
        let p3 = refiner.add_point(x1, y1);

        // split the grid rectangle along its diagonal
        let t0 = refiner.add_triangle(p3, p0, p2, -1, -1, -1, None);
        refiner.add_triangle(p0, p3, p1, t0 as i32, -1, -1, None);
        refiner.flush();

        refiner
    }

    fn run(&mut self, max_error: f32) {
        while self.max_queued_error() > max_error {
            self.step();
            self.flush();
        }
    }

    fn max_queued_error(&self) -> f32 {
        self.queue.first().map(|&(e, _)| e).unwrap_or(0.0)
    }

    fn into_triangulation(self) -> GridTriangulation {
        GridTriangulation {
            vertices: self.coords,
            triangles: self.triangles,
        }
    }

    #[inline]
    fn height_at(&self, p: (u32, u32)) -> f32 {
        self.field.sample(p.0, p.1)
    }

    fn add_point(&mut self, x: u32, y: u32) -> u32 {
        self.coords.push((x, y));
        (self.coords.len() - 1) as u32
    }

    /// Write a triangle into `slot` (or append), link its half-edges, and
    /// queue it for rasterization. Returns the triangle's base edge index.
    fn add_triangle(
        &mut self,
        a: u32,
        b: u32,
        c: u32,
        ab: i32,
        bc: i32,
        ca: i32,
        slot: Option<usize>,
    ) -> usize {
        let e = match slot {
            Some(e) => e,
            None => {
                let e = self.triangles.len();
                self.triangles.resize(e + 3, 0);
                self.halfedges.resize(e + 3, -1);
                self.candidates.push((0, 0));
                self.rms.push(0.0);
                self.queue_index.push(-1);
                e
            }
        };
        let t = e / 3;

        self.triangles[e] = a;
        self.triangles[e + 1] = b;
        self.triangles[e + 2] = c;
        self.halfedges[e] = ab;
        self.halfedges[e + 1] = bc;
        self.halfedges[e + 2] = ca;
        if ab >= 0 {
            self.halfedges[ab as usize] = e as i32;
        }
        if bc >= 0 {
            self.halfedges[bc as usize] = (e + 1) as i32;
        }
        if ca >= 0 {
            self.halfedges[ca as usize] = (e + 2) as i32;
        }

        debug_assert_eq!(self.queue_index[t], -1, "reused slot still queued");
        self.candidates[t] = (0, 0);
        self.rms[t] = 0.0;
        self.pending.push(t as u32);
        e
    }

    /// Rasterize every pending triangle and queue it by its worst deviation.
    fn flush(&mut self) {
        while let Some(t) = self.pending.pop() {
            let e = t as usize * 3;
            let p0 = self.coords[self.triangles[e] as usize];
            let p1 = self.coords[self.triangles[e + 1] as usize];
            let p2 = self.coords[self.triangles[e + 2] as usize];
            self.find_candidate(p0, p1, p2, t);
        }
    }

    /// Scan the samples covered by a triangle for the one where the linear
    /// interpolation deviates most from the heightfield.
    fn find_candidate(&mut self, p0: (u32, u32), p1: (u32, u32), p2: (u32, u32), t: u32) {
        let (p0x, p0y) = (p0.0 as i64, p0.1 as i64);
        let (p1x, p1y) = (p1.0 as i64, p1.1 as i64);
        let (p2x, p2y) = (p2.0 as i64, p2.1 as i64);

        let min_x = p0x.min(p1x).min(p2x);
        let min_y = p0y.min(p1y).min(p2y);
        let max_x = p0x.max(p1x).max(p2x);
        let max_y = p0y.max(p1y).max(p2y);

        // edge functions stepped incrementally across the bounding box
        let mut w00 = orient(p1x, p1y, p2x, p2y, min_x, min_y);
        let mut w01 = orient(p2x, p2y, p0x, p0y, min_x, min_y);
        let mut w02 = orient(p0x, p0y, p1x, p1y, min_x, min_y);
        let a01 = p1y - p0y;
        let b01 = p0x - p1x;
        let a12 = p2y - p1y;
        let b12 = p1x - p2x;
        let a20 = p0y - p2y;
        let b20 = p2x - p0x;

        let area = orient(p0x, p0y, p1x, p1y, p2x, p2y);
        debug_assert!(area > 0, "degenerate or flipped triangle");
        let z0 = self.height_at(p0) as f64 / area as f64;
        let z1 = self.height_at(p1) as f64 / area as f64;
        let z2 = self.height_at(p2) as f64 / area as f64;

        let mut max_error = 0.0f64;
        let mut mx = 0i64;
        let mut my = 0i64;
        let mut rms = 0.0f64;

        for y in min_y..=max_y {
            let mut w0 = w00;
            let mut w1 = w01;
            let mut w2 = w02;
            let mut was_inside = false;
            for x in min_x..=max_x {
                if w0 >= 0 && w1 >= 0 && w2 >= 0 {
                    was_inside = true;
                    let z = z0 * w0 as f64 + z1 * w1 as f64 + z2 * w2 as f64;
                    let dz = (z - self.field.sample(x as u32, y as u32) as f64).abs();
                    rms += dz * dz;
                    if dz > max_error {
                        max_error = dz;
                        mx = x;
                        my = y;
                    }
                } else if was_inside {
                    break;
                }
                w0 += a12;
                w1 += a20;
                w2 += a01;
            }
            w00 += b12;
            w01 += b20;
            w02 += b01;
        }

        // a candidate that coincides with a corner cannot be inserted again
        if (mx == p0x && my == p0y) || (mx == p1x && my == p1y) || (mx == p2x && my == p2y) {
            max_error = 0.0;
        }

        self.candidates[t as usize] = (mx as u32, my as u32);
        self.rms[t as usize] = rms;
        self.queue_push(t, max_error as f32);
    }

    /// Split the worst triangle at its candidate sample.
    fn step(&mut self) {
        let t = self.queue_pop();

        let e0 = t as usize * 3;
        let e1 = e0 + 1;
        let e2 = e0 + 2;

        let p0 = self.triangles[e0];
        let p1 = self.triangles[e1];
        let p2 = self.triangles[e2];

        let a = self.coords[p0 as usize];
        let b = self.coords[p1 as usize];
        let c = self.coords[p2 as usize];
        let (px, py) = self.candidates[t as usize];

        let pn = self.add_point(px, py);
        let on_edge = |p: (u32, u32), q: (u32, u32)| {
            orient(
                p.0 as i64, p.1 as i64, q.0 as i64, q.1 as i64, px as i64, py as i64,
            ) == 0
        };

        if on_edge(a, b) {
            self.handle_collinear(pn, e0);
        } else if on_edge(b, c) {
            self.handle_collinear(pn, e1);
        } else if on_edge(c, a) {
            self.handle_collinear(pn, e2);
        } else {
            let h0 = self.halfedges[e0];
            let h1 = self.halfedges[e1];
            let h2 = self.halfedges[e2];

            let t0 = self.add_triangle(p0, p1, pn, h0, -1, -1, Some(e0));
            let t1 = self.add_triangle(p1, p2, pn, h1, -1, (t0 + 1) as i32, None);
            let t2 = self.add_triangle(p2, p0, pn, h2, (t0 + 2) as i32, (t1 + 1) as i32, None);

            self.legalize(t0);
            self.legalize(t1);
            self.legalize(t2);
        }
    }

    /// Flip the edge shared with `a`'s neighbor when it violates the
    /// Delaunay condition, then recurse into the newly exposed edges.
    fn legalize(&mut self, a: usize) {
        let b = self.halfedges[a];
        if b < 0 {
            return;
        }
        let b = b as usize;

        let a0 = a - a % 3;
        let b0 = b - b % 3;
        let al = a0 + (a + 1) % 3;
        let ar = a0 + (a + 2) % 3;
        let bl = b0 + (b + 2) % 3;
        let br = b0 + (b + 1) % 3;
        let p0 = self.triangles[ar];
        let pr = self.triangles[a];
        let pl = self.triangles[al];
        let p1 = self.triangles[bl];

        if !in_circle(
            self.coords[p0 as usize],
            self.coords[pr as usize],
            self.coords[pl as usize],
            self.coords[p1 as usize],
        ) {
            return;
        }

        let hal = self.halfedges[al];
        let har = self.halfedges[ar];
        let hbl = self.halfedges[bl];
        let hbr = self.halfedges[br];

        self.queue_remove((a0 / 3) as u32);
        self.queue_remove((b0 / 3) as u32);

        let t0 = self.add_triangle(p0, p1, pl, -1, hbl, hal, Some(a0));
        let t1 = self.add_triangle(p1, p0, pr, t0 as i32, har, hbr, Some(b0));

        self.legalize(t0 + 1);
        self.legalize(t1 + 2);
    }

    /// The candidate landed exactly on edge `a`: split the two incident
    /// triangles (or just the one, on the hull) into four (two).
    fn handle_collinear(&mut self, pn: u32, a: usize) {
        let a0 = a - a % 3;
        let al = a0 + (a + 1) % 3;
        let ar = a0 + (a + 2) % 3;
        let p0 = self.triangles[ar];
        let pr = self.triangles[a];
        let pl = self.triangles[al];
        let hal = self.halfedges[al];
        let har = self.halfedges[ar];

        let b = self.halfedges[a];

        if b < 0 {
            let t0 = self.add_triangle(pn, p0, pr, -1, har, -1, Some(a0));
            let t1 = self.add_triangle(p0, pn, pl, t0 as i32, -1, hal, None);
            self.legalize(t0 + 1);
            self.legalize(t1 + 2);
            return;
        }

        let b = b as usize;
        let b0 = b - b % 3;
        let bl = b0 + (b + 2) % 3;
        let br = b0 + (b + 1) % 3;
        let p1 = self.triangles[bl];
        let hbl = self.halfedges[bl];
        let hbr = self.halfedges[br];

        self.queue_remove((b0 / 3) as u32);

        let t0 = self.add_triangle(p0, pr, pn, har, -1, -1, Some(a0));
        let t1 = self.add_triangle(pr, p1, pn, hbr, -1, (t0 + 1) as i32, Some(b0));
        let t2 = self.add_triangle(p1, pl, pn, hbl, -1, (t1 + 1) as i32, None);
        let t3 = self.add_triangle(pl, p0, pn, hal, (t0 + 2) as i32, (t2 + 1) as i32, None);

        self.legalize(t0);
        self.legalize(t1);
        self.legalize(t2);
        self.legalize(t3);
    }

    // heap keyed by (error, rms), largest first

    fn greater(&self, i: usize, j: usize) -> bool {
        let (ei, ti) = self.queue[i];
        let (ej, tj) = self.queue[j];
        if ei != ej {
            ei > ej
        } else {
            self.rms[ti as usize] > self.rms[tj as usize]
        }
    }

    fn heap_swap(&mut self, i: usize, j: usize) {
        self.queue.swap(i, j);
        self.queue_index[self.queue[i].1 as usize] = i as i32;
        self.queue_index[self.queue[j].1 as usize] = j as i32;
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if !self.greater(i, parent) {
                break;
            }
            self.heap_swap(i, parent);
            i = parent;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        loop {
            let left = 2 * i + 1;
            if left >= self.queue.len() {
                break;
            }
            let right = left + 1;
            let mut best = left;
            if right < self.queue.len() && self.greater(right, left) {
                best = right;
            }
            if !self.greater(best, i) {
                break;
            }
            self.heap_swap(i, best);
            i = best;
        }
    }

    fn queue_push(&mut self, t: u32, error: f32) {
        let i = self.queue.len();
        self.queue_index[t as usize] = i as i32;
        self.queue.push((error, t));
        self.sift_up(i);
    }

    fn queue_pop(&mut self) -> u32 {
        let last = self.queue.len() - 1;
        self.heap_swap(0, last);
        let (_, t) = self.queue.pop().expect("pop from empty triangle queue");
        self.queue_index[t as usize] = -1;
        if !self.queue.is_empty() {
            self.sift_down(0);
        }
        t
    }

    /// Drop a triangle from the heap, or from the pending list if it has not
    /// been rasterized yet.
    fn queue_remove(&mut self, t: u32) {
        let i = self.queue_index[t as usize];
        if i < 0 {
            let pos = self
                .pending
                .iter()
                .position(|&p| p == t)
                .expect("triangle in neither queue nor pending");
            self.pending.swap_remove(pos);
            return;
        }
        let i = i as usize;
        let last = self.queue.len() - 1;
        if i != last {
            self.heap_swap(i, last);
        }
        self.queue.pop();
        self.queue_index[t as usize] = -1;
        if i < self.queue.len() {
            self.sift_down(i);
            self.sift_up(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(w: u32, h: u32, f: impl Fn(u32, u32) -> f32) -> Heightfield {
        let f = &f;
        let samples = (0..h).flat_map(|y| (0..w).map(move |x| f(x, y))).collect();
        Heightfield::new(w, h, samples)
    }

    /// Check that the linear interpolation over every triangle stays within
    /// `bound` of the source samples it covers.
    fn assert_error_bound(field: &Heightfield, tri: &GridTriangulation, bound: f64) {
        for t in 0..tri.triangles.len() / 3 {
            let p: Vec<(i64, i64)> = (0..3)
                .map(|k| {
                    let v = tri.vertices[tri.triangles[t * 3 + k] as usize];
                    (v.0 as i64, v.1 as i64)
                })
                .collect();
            let area = orient(p[0].0, p[0].1, p[1].0, p[1].1, p[2].0, p[2].1);
            assert!(area != 0, "degenerate triangle {}", t);
            let z: Vec<f64> = (0..3)
                .map(|k| {
                    let v = tri.vertices[tri.triangles[t * 3 + k] as usize];
                    field.sample(v.0, v.1) as f64 / area as f64
                })
                .collect();
            let min_x = p.iter().map(|q| q.0).min().unwrap();
            let max_x = p.iter().map(|q| q.0).max().unwrap();
            let min_y = p.iter().map(|q| q.1).min().unwrap();
            let max_y = p.iter().map(|q| q.1).max().unwrap();
            for y in min_y..=max_y {
                for x in min_x..=max_x {
                    let w0 = orient(p[1].0, p[1].1, p[2].0, p[2].1, x, y);
                    let w1 = orient(p[2].0, p[2].1, p[0].0, p[0].1, x, y);
                    let w2 = orient(p[0].0, p[0].1, p[1].0, p[1].1, x, y);
                    let inside = if area > 0 {
                        w0 >= 0 && w1 >= 0 && w2 >= 0
                    } else {
                        w0 <= 0 && w1 <= 0 && w2 <= 0
                    };
                    if inside {
                        let interp = z[0] * w0 as f64 + z[1] * w1 as f64 + z[2] * w2 as f64;
                        let dz = (interp - field.sample(x as u32, y as u32) as f64).abs();
                        assert!(
                            dz <= bound + 1e-4,
                            "sample ({}, {}) deviates by {} > {}",
                            x,
                            y,
                            dz,
                            bound
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn planar_field_needs_only_two_triangles() {
        let hf = field(8, 6, |x, y| x as f32 + 2.0 * y as f32);
        let tri = triangulate(&hf, 0.01);
        assert_eq!(tri.triangles.len() / 3, 2);
        assert_eq!(tri.vertices.len(), 4);
    }

    #[test]
    fn bound_is_honored_on_a_bumpy_field() {
        let hf = field(33, 33, |x, y| {
            ((x as f32 * 0.6).sin() + (y as f32 * 0.35).cos()) * 40.0
        });
        for &bound in &[20.0f32, 5.0, 1.0, 0.25] {
            let tri = triangulate(&hf, bound);
            assert_error_bound(&hf, &tri, bound as f64);
        }
    }

    #[test]
    fn non_square_grids_are_accepted() {
        let hf = field(5, 11, |x, y| (x * 3 + y) as f32);
        let tri = triangulate(&hf, 0.5);
        assert_error_bound(&hf, &tri, 0.5);
    }

    #[test]
    fn triangle_count_is_monotonic_in_the_bound() {
        let hf = field(24, 24, |x, y| ((x * x + y * y) as f32).sqrt() * 3.0);
        let coarse = triangulate(&hf, 10.0).triangles.len();
        let medium = triangulate(&hf, 2.0).triangles.len();
        let fine = triangulate(&hf, 0.2).triangles.len();
        assert!(coarse <= medium && medium <= fine);
    }

    #[test]
    fn spike_forces_an_insert_at_the_spike() {
        let hf = field(9, 9, |x, y| if x == 4 && y == 4 { 100.0 } else { 0.0 });
        let tri = triangulate(&hf, 1.0);
        assert!(tri.vertices.contains(&(4, 4)));
        assert_error_bound(&hf, &tri, 1.0);
    }
}
