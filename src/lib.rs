//! relief3d: tiled terrain mesh streaming.
//!
//! Decodes raster-encoded elevation tiles into heightfields, tessellates them
//! into error-bounded triangle meshes, and streams mesh+texture pairs to an
//! external renderer as the camera moves. Rendering, tile scheduling and
//! catalog loading live outside this crate; the seams are `TileFetch`,
//! `TerrainModeController::tile_data` and `on_tiles_resident`.

pub mod config;
pub mod controller;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod loader;
pub mod mesh;
pub mod project;
pub mod tessellate;
pub mod tiling;
pub mod zrange;

pub use config::{ElevationSource, ModePolicy, RenderHints, SchedulerOptions, TerrainConfig};
pub use controller::{PendingReload, RenderMode, TerrainModeController};
pub use decode::{decode_raster, DecodeParams, Heightfield};
pub use error::{TerrainError, TerrainResult};
pub use fetch::{expand_template, HttpFetcher, TileFetch};
pub use loader::{SingleLoadRequest, TerrainTileLoader, TextureAsset, TileAssets, TileLoadRequest};
pub use mesh::{BoundingBox, Indices, TerrainMesh, TerrainVertex};
pub use project::{project_tile_bounds, LocalMercator};
pub use tessellate::{tessellate, TesselatorKind};
pub use tiling::{GeoBounds, TileBounds, TileKey};
pub use zrange::ZRange;
