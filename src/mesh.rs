//! Triangle mesh data model for tessellated terrain.
//!
//! Decision: vertices carry full XYZ plus [0,1]x[0,1] UVs so a draped texture
//! maps without further work. Indices form CCW triangles in world XY.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::tiling::TileBounds;

#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Index buffer with width chosen by vertex count.
#[derive(Debug, Clone)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Indices::U16(v) => v.len(),
            Indices::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> usize {
        match self {
            Indices::U16(v) => v[i] as usize,
            Indices::U32(v) => v[i] as usize,
        }
    }

    /// Narrow a u32 index list to u16 when every vertex is addressable.
    pub fn from_u32(indices: Vec<u32>, vertex_count: usize) -> Self {
        if vertex_count <= u16::MAX as usize + 1 {
            Indices::U16(indices.into_iter().map(|i| i as u16).collect())
        } else {
            Indices::U32(indices)
        }
    }
}

/// Axis-aligned box exactly bounding a mesh's positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const ZERO: BoundingBox = BoundingBox {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn of_positions<'a>(positions: impl Iterator<Item = &'a [f32; 3]>) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;
        for p in positions {
            let v = Vec3::from(*p);
            min = min.min(v);
            max = max.max(v);
            any = true;
        }
        if any {
            Self { min, max }
        } else {
            Self::ZERO
        }
    }
}

#[derive(Debug, Clone)]
pub struct TerrainMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Indices,
    pub bounding_box: BoundingBox,
}

impl TerrainMesh {
    /// Assemble a mesh, computing the exact bounding box of its positions.
    pub fn new(vertices: Vec<TerrainVertex>, indices: Indices) -> Self {
        let bounding_box = BoundingBox::of_positions(vertices.iter().map(|v| &v.position));
        Self {
            vertices,
            indices,
            bounding_box,
        }
    }

    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Indices::U16(Vec::new()),
            bounding_box: BoundingBox::ZERO,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Flat two-triangle quad over the tile bounds at elevation `z`.
    ///
    /// Doubles as the placeholder geometry a renderer anchors before tile
    /// data arrives and as the degenerate-heightfield fallback.
    pub fn flat_quad(bounds: &TileBounds, z: f32) -> Self {
        let (min, max) = (bounds.min, bounds.max);
        let vertices = vec![
            TerrainVertex {
                position: [min.x as f32, min.y as f32, z],
                uv: [0.0, 1.0],
            },
            TerrainVertex {
                position: [max.x as f32, min.y as f32, z],
                uv: [1.0, 1.0],
            },
            TerrainVertex {
                position: [min.x as f32, max.y as f32, z],
                uv: [0.0, 0.0],
            },
            TerrainVertex {
                position: [max.x as f32, max.y as f32, z],
                uv: [1.0, 0.0],
            },
        ];
        // CCW in world XY: (0,1,2) and (2,1,3)
        let indices = Indices::U16(vec![0, 1, 2, 2, 1, 3]);
        Self::new(vertices, indices)
    }
}
