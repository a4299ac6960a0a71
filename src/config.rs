//! Configuration surface consumed by the mode controller.
//!
//! Reload-relevant fields are diffed through an explicit `ConfigSnapshot`
//! rather than inferred from caller lifecycles; scheduler and rendering
//! fields are opaque pass-throughs forwarded to the external collaborators.

use serde::{Deserialize, Serialize};

use crate::decode::DecodeParams;
use crate::tessellate::TesselatorKind;
use crate::tiling::TileKey;

/// Elevation raster source: one URL (plain or templated) or several
/// templates load-balanced across tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElevationSource {
    Url(String),
    Urls(Vec<String>),
}

impl ElevationSource {
    /// True when the source addresses tiles rather than a single raster.
    pub fn is_template(&self) -> bool {
        let url = match self {
            ElevationSource::Url(u) => u.as_str(),
            ElevationSource::Urls(urls) => match urls.first() {
                Some(u) => u.as_str(),
                None => return false,
            },
        };
        url.contains("{x}") && url.contains("{y}")
    }

    /// Template for a given tile; multi-template sources spread tiles over
    /// the list by `(x + y) % n`.
    pub fn template_for(&self, key: TileKey) -> Option<&str> {
        match self {
            ElevationSource::Url(u) => Some(u.as_str()),
            ElevationSource::Urls(urls) => {
                if urls.is_empty() {
                    None
                } else {
                    let pick = (key.x as usize + key.y as usize) % urls.len();
                    Some(urls[pick].as_str())
                }
            }
        }
    }
}

/// Rendering mode selection policy: derive from the source shape, or force
/// one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModePolicy {
    /// Tiled iff the elevation source is a URL template.
    #[default]
    Auto,
    Single,
    Tiled,
}

fn default_max_error() -> f32 {
    4.0
}

fn default_max_requests() -> u32 {
    6
}

fn default_tile_size() -> u32 {
    512
}

/// Options forwarded verbatim to the external tile scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerOptions {
    pub max_requests: u32,
    pub tile_size: u32,
    pub min_zoom: u32,
    pub max_zoom: Option<u32>,
    pub max_cache_size: Option<usize>,
    pub refinement_strategy: Option<String>,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            tile_size: default_tile_size(),
            min_zoom: 0,
            max_zoom: None,
            max_cache_size: None,
            refinement_strategy: None,
        }
    }
}

/// Pass-through rendering hints, opaque to the pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderHints {
    pub wireframe: bool,
    pub color: Option<[f32; 4]>,
    pub material: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerrainConfig {
    /// Elevation raster source; absent renders nothing.
    pub elevation_data: Option<ElevationSource>,
    /// Optional color overlay, plain URL or template.
    pub texture: Option<String>,
    /// Tessellation error tolerance in meters.
    pub mesh_max_error: f32,
    /// `[minX, minY, maxX, maxY]` planar bounds override.
    pub bounds: Option<[f64; 4]>,
    pub elevation_decoder: DecodeParams,
    pub tesselator: TesselatorKind,
    pub mode: ModePolicy,
    #[serde(flatten)]
    pub scheduler: SchedulerOptions,
    #[serde(flatten)]
    pub rendering: RenderHints,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            elevation_data: None,
            texture: None,
            mesh_max_error: default_max_error(),
            bounds: None,
            elevation_decoder: DecodeParams::default(),
            tesselator: TesselatorKind::Auto,
            mode: ModePolicy::Auto,
            scheduler: SchedulerOptions::default(),
            rendering: RenderHints::default(),
        }
    }
}

/// The reload-relevant slice of a config, compared by value to decide
/// whether inputs changed. Scheduler and rendering hints are deliberately
/// excluded: they never invalidate a loaded mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSnapshot {
    pub elevation_data: Option<ElevationSource>,
    pub texture: Option<String>,
    pub mesh_max_error: f32,
    pub bounds: Option<[f64; 4]>,
    pub elevation_decoder: DecodeParams,
    pub tesselator: TesselatorKind,
    pub mode: ModePolicy,
}

impl ConfigSnapshot {
    pub fn of(config: &TerrainConfig) -> Self {
        Self {
            elevation_data: config.elevation_data.clone(),
            texture: config.texture.clone(),
            mesh_max_error: config.mesh_max_error,
            bounds: config.bounds,
            elevation_decoder: config.elevation_decoder,
            tesselator: config.tesselator,
            mode: config.mode,
        }
    }
}
