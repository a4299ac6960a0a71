//! Mode controller: the top of the pipeline.
//!
//! Owns the single-mesh vs. tiled decision, change detection over the
//! configuration, and the latest-wins rule for asynchronous single-mesh
//! reloads. Every reload carries a monotonically increasing generation;
//! a completion is applied only while its generation is still current, so
//! a slow stale load can never overwrite a newer result.

use log::{debug, info};

use crate::config::{ConfigSnapshot, ModePolicy, TerrainConfig};
use crate::error::TerrainResult;
use crate::fetch::TileFetch;
use crate::loader::{SingleLoadRequest, TerrainTileLoader, TextureAsset, TileAssets, TileLoadRequest};
use crate::mesh::TerrainMesh;
use crate::tiling::{TileBounds, TileKey};
use crate::zrange::ZRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Single,
    Tiled,
}

impl RenderMode {
    /// The effective mode for a policy and elevation source shape.
    pub fn resolve(policy: ModePolicy, config: &TerrainConfig) -> RenderMode {
        match policy {
            ModePolicy::Single => RenderMode::Single,
            ModePolicy::Tiled => RenderMode::Tiled,
            ModePolicy::Auto => match &config.elevation_data {
                Some(source) if source.is_template() => RenderMode::Tiled,
                _ => RenderMode::Single,
            },
        }
    }
}

/// Ticket for an issued single-mesh reload. The caller runs the load and
/// reports back through [`TerrainModeController::complete`] with the same
/// generation.
#[derive(Debug)]
pub struct PendingReload {
    pub generation: u64,
    pub request: SingleLoadRequest,
}

pub struct TerrainModeController<F> {
    loader: TerrainTileLoader<F>,
    config: TerrainConfig,
    snapshot: Option<ConfigSnapshot>,
    mode: RenderMode,
    generation: u64,
    current: Option<TileAssets>,
    z_range: Option<ZRange>,
}

impl<F: TileFetch> TerrainModeController<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            loader: TerrainTileLoader::new(fetcher),
            config: TerrainConfig::default(),
            snapshot: None,
            mode: RenderMode::Single,
            generation: 0,
            current: None,
            z_range: None,
        }
    }

    /// Absorb a configuration. Returns a reload ticket when a
    /// reload-relevant field changed and the controller is in single mode;
    /// unchanged configs and tiled mode return `None`.
    pub fn sync(&mut self, config: &TerrainConfig) -> Option<PendingReload> {
        let snapshot = ConfigSnapshot::of(config);
        if self.snapshot.as_ref() == Some(&snapshot) {
            return None;
        }
        self.snapshot = Some(snapshot);
        self.config = config.clone();

        let mode = RenderMode::resolve(config.mode, config);
        if mode != self.mode {
            info!("terrain mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            // the resident tile set starts over with the new mode
            self.current = None;
            self.z_range = None;
        }

        match self.mode {
            RenderMode::Tiled => None,
            RenderMode::Single => {
                self.generation += 1;
                Some(PendingReload {
                    generation: self.generation,
                    request: self.single_request(),
                })
            }
        }
    }

    /// Apply a finished single-mesh load. Results for superseded
    /// generations are dropped; returns whether the result was applied.
    pub fn complete(&mut self, generation: u64, result: Option<TileAssets>) -> bool {
        if self.mode != RenderMode::Single || generation != self.generation {
            debug!(
                "dropping stale load result (generation {} != current {})",
                generation, self.generation
            );
            return false;
        }
        self.z_range = result
            .as_ref()
            .map(|assets| ZRange::new(assets.mesh.bounding_box.min.z, assets.mesh.bounding_box.max.z));
        self.current = result;
        true
    }

    /// Sync, load and apply in one call, for callers without their own
    /// scheduling. The latest-wins rule still holds if calls overlap.
    pub async fn refresh(&mut self, config: &TerrainConfig) -> TerrainResult<()> {
        if let Some(pending) = self.sync(config) {
            let result = self.loader.load_single(&pending.request).await?;
            self.complete(pending.generation, result);
        }
        Ok(())
    }

    /// Tiled-mode entry point for the external tile scheduler: load the
    /// mesh+texture pair for one visible tile.
    pub async fn tile_data(&self, key: TileKey) -> TerrainResult<Option<TileAssets>> {
        let request = TileLoadRequest {
            key,
            elevation: self.config.elevation_data.clone(),
            texture: self.config.texture.clone(),
            decoder: self.config.elevation_decoder,
            max_error: self.config.mesh_max_error,
            tesselator: self.config.tesselator,
            bounds_override: self.config.bounds.map(TileBounds::from_array),
        };
        self.loader.load_tile(&request).await
    }

    /// Scheduler callback reporting the currently resident tiles; feeds the
    /// expansion-only elevation aggregate used for depth culling.
    pub fn on_tiles_resident(&mut self, tiles: &[&TileAssets]) {
        self.z_range = ZRange::update(self.z_range, tiles.iter().map(|t| &t.mesh.bounding_box));
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn current_mesh(&self) -> Option<&TerrainMesh> {
        self.current.as_ref().map(|a| &a.mesh)
    }

    pub fn current_texture(&self) -> Option<&TextureAsset> {
        self.current.as_ref().and_then(|a| a.texture.as_ref())
    }

    pub fn z_range(&self) -> Option<ZRange> {
        self.z_range
    }

    fn single_request(&self) -> SingleLoadRequest {
        SingleLoadRequest {
            elevation: self.config.elevation_data.clone(),
            texture: self.config.texture.clone(),
            decoder: self.config.elevation_decoder,
            max_error: self.config.mesh_max_error,
            tesselator: self.config.tesselator,
            bounds: self.config.bounds.map(TileBounds::from_array),
        }
    }
}
