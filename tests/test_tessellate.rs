// tests/test_tessellate.rs
// End-to-end properties of the heightfield tessellation strategies.

use glam::DVec2;
use relief3d::{tessellate, Heightfield, TerrainMesh, TesselatorKind, TileBounds};

fn field(w: u32, h: u32, f: impl Fn(u32, u32) -> f32) -> Heightfield {
    let f = &f;
    let samples = (0..h).flat_map(|y| (0..w).map(move |x| f(x, y))).collect();
    Heightfield::new(w, h, samples)
}

fn bounds() -> TileBounds {
    TileBounds::new(DVec2::new(-256.0, -256.0), DVec2::new(256.0, 256.0))
}

fn assert_valid(mesh: &TerrainMesh) {
    for i in 0..mesh.indices.len() {
        assert!(
            mesh.indices.get(i) < mesh.vertex_count(),
            "index {} out of range",
            i
        );
    }
    let bb = &mesh.bounding_box;
    for v in &mesh.vertices {
        assert!(v.position[0] >= bb.min.x && v.position[0] <= bb.max.x);
        assert!(v.position[1] >= bb.min.y && v.position[1] <= bb.max.y);
        assert!(v.position[2] >= bb.min.z && v.position[2] <= bb.max.z);
    }
}

#[test]
fn both_strategies_reproduce_sample_heights_at_vertices() {
    let hf = field(17, 17, |x, y| ((x as f32 * 0.9).sin() + (y as f32 * 0.5).cos()) * 30.0);

    for kind in [TesselatorKind::Rtin, TesselatorKind::Greedy] {
        let mesh = tessellate(&hf, 0.5, kind, &bounds()).unwrap();
        assert!(mesh.triangle_count() > 2, "{:?} produced too few triangles", kind);
        assert_valid(&mesh);

        // every vertex sits exactly on a source sample
        for v in &mesh.vertices {
            let gx = (v.uv[0] * 16.0).round() as u32;
            let gy = (v.uv[1] * 16.0).round() as u32;
            assert_eq!(
                v.position[2],
                hf.sample(gx, gy),
                "{:?} vertex off the heightfield at grid ({}, {})",
                kind,
                gx,
                gy
            );
        }
    }
}

#[test]
fn shrinking_the_bound_never_drops_triangles() {
    let hf = field(33, 33, |x, y| {
        let (fx, fy) = (x as f32 / 32.0, y as f32 / 32.0);
        (fx * 6.0).sin() * 80.0 + (fy * 9.0).cos() * 45.0
    });

    for kind in [TesselatorKind::Rtin, TesselatorKind::Greedy] {
        let mut last = 0usize;
        for max_error in [50.0f32, 10.0, 2.0, 0.5, 0.1] {
            let mesh = tessellate(&hf, max_error, kind, &bounds()).unwrap();
            assert!(
                mesh.triangle_count() >= last,
                "{:?}: {} triangles at bound {}, fewer than previous {}",
                kind,
                mesh.triangle_count(),
                max_error,
                last
            );
            last = mesh.triangle_count();
        }
    }
}

#[test]
fn tight_bound_recovers_the_full_grid_extremes() {
    let hf = field(9, 9, |x, y| if (x, y) == (3, 5) { 77.0 } else { 1.0 });
    let mesh = tessellate(&hf, 0.01, TesselatorKind::Auto, &bounds()).unwrap();
    assert_eq!(mesh.bounding_box.max.z, 77.0);
    assert_eq!(mesh.bounding_box.min.z, 1.0);
    assert_valid(&mesh);
}

#[test]
fn degenerate_fields_never_fail() {
    let cases = vec![
        Heightfield::new(0, 0, vec![]),
        Heightfield::new(1, 1, vec![5.0]),
        Heightfield::new(4, 1, vec![1.0, 2.0, 3.0, 4.0]),
        Heightfield::new(1, 3, vec![1.0, 2.0, 3.0]),
        field(8, 8, |_, _| 9.0),
    ];
    for hf in cases {
        let mesh = tessellate(&hf, 1.0, TesselatorKind::Auto, &bounds())
            .expect("degenerate input must still tessellate");
        assert_valid(&mesh);
        if hf.is_empty() {
            assert_eq!(mesh.triangle_count(), 0);
        } else {
            assert_eq!(mesh.triangle_count(), 2);
        }
    }
}

#[test]
fn coarse_bound_on_gentle_terrain_gives_a_sparse_mesh() {
    // gentle slope, huge tolerance: expect the minimal two-triangle cover
    let hf = field(65, 65, |x, y| (x + y) as f32 * 0.01);
    let mesh = tessellate(&hf, 100.0, TesselatorKind::Auto, &bounds()).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
}

#[test]
fn uv_coordinates_span_the_unit_square() {
    let hf = field(17, 17, |x, y| (x * y) as f32);
    let mesh = tessellate(&hf, 0.01, TesselatorKind::Auto, &bounds()).unwrap();
    let mut seen = [false; 4];
    for v in &mesh.vertices {
        assert!(v.uv[0] >= 0.0 && v.uv[0] <= 1.0);
        assert!(v.uv[1] >= 0.0 && v.uv[1] <= 1.0);
        match v.uv {
            [0.0, 0.0] => seen[0] = true,
            [1.0, 0.0] => seen[1] = true,
            [0.0, 1.0] => seen[2] = true,
            [1.0, 1.0] => seen[3] = true,
            _ => {}
        }
    }
    assert_eq!(seen, [true; 4], "all four grid corners must be retained");
}
