//! Per-tile load orchestration.
//!
//! One pipeline serves both rendering modes: resolve the tile's resource
//! URLs, fetch elevation and texture concurrently, decode the raster into a
//! heightfield, tessellate, and pair the mesh with the optional texture.
//! Elevation failure fails the tile; texture failure only costs the overlay.

use image::RgbaImage;
use log::{debug, warn};

use crate::config::ElevationSource;
use crate::decode::{decode_raster, DecodeParams, Heightfield};
use crate::error::{TerrainError, TerrainResult};
use crate::fetch::{expand_template, TileFetch};
use crate::mesh::TerrainMesh;
use crate::project::project_tile_bounds;
use crate::tessellate::{tessellate, TesselatorKind};
use crate::tiling::{TileBounds, TileKey};

/// Raw texture overlay bytes for one tile. Image decoding is the renderer's
/// concern; the bytes pass through untouched.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// A loaded tile: its mesh and, when the overlay fetch succeeded, a texture.
#[derive(Debug, Clone)]
pub struct TileAssets {
    pub key: TileKey,
    pub mesh: TerrainMesh,
    pub texture: Option<TextureAsset>,
}

/// Tiled-mode load request for one tile.
#[derive(Debug, Clone)]
pub struct TileLoadRequest {
    pub key: TileKey,
    pub elevation: Option<ElevationSource>,
    pub texture: Option<String>,
    pub decoder: DecodeParams,
    pub max_error: f32,
    pub tesselator: TesselatorKind,
    /// Supplied by single-mesh mode; tiled mode derives bounds from the
    /// tile's geography.
    pub bounds_override: Option<TileBounds>,
}

/// Single-mesh-mode load request covering the whole dataset.
#[derive(Debug, Clone)]
pub struct SingleLoadRequest {
    pub elevation: Option<ElevationSource>,
    pub texture: Option<String>,
    pub decoder: DecodeParams,
    pub max_error: f32,
    pub tesselator: TesselatorKind,
    pub bounds: Option<TileBounds>,
}

pub struct TerrainTileLoader<F> {
    fetcher: F,
}

impl<F: TileFetch> TerrainTileLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Load one tile. `Ok(None)` means no elevation source is configured
    /// and nothing should render; a fetch or decode failure is an error.
    pub async fn load_tile(&self, request: &TileLoadRequest) -> TerrainResult<Option<TileAssets>> {
        let Some(source) = &request.elevation else {
            return Ok(None);
        };
        let Some(template) = source.template_for(request.key) else {
            return Ok(None);
        };

        let elevation_url = expand_template(template, request.key);
        let texture_url = request
            .texture
            .as_deref()
            .map(|t| expand_template(t, request.key));

        let (raster, texture) = self
            .fetch_pair(&elevation_url, texture_url.as_deref())
            .await?;
        let heightfield = decode_raster(&raster, &request.decoder);

        let bounds = match request.bounds_override {
            Some(b) => b,
            None => project_tile_bounds(&request.key.geo_bounds(), request.key.zoom),
        };

        let mesh = tessellate(
            &heightfield,
            request.max_error,
            request.tesselator,
            &bounds,
        )?;
        debug!(
            "tile {:?}: {} vertices, {} triangles, texture {}",
            request.key,
            mesh.vertex_count(),
            mesh.triangle_count(),
            if texture.is_some() { "ok" } else { "absent" }
        );

        Ok(Some(TileAssets {
            key: request.key,
            mesh,
            texture,
        }))
    }

    /// Load the whole dataset as one mesh under the synthetic whole-dataset
    /// key. Without an explicit bound, the raster's pixel extent is used.
    pub async fn load_single(
        &self,
        request: &SingleLoadRequest,
    ) -> TerrainResult<Option<TileAssets>> {
        let Some(source) = &request.elevation else {
            return Ok(None);
        };
        let Some(url) = source.template_for(TileKey::WHOLE) else {
            return Ok(None);
        };

        let (raster, texture) = self
            .fetch_pair(url, request.texture.as_deref())
            .await?;
        let heightfield = decode_raster(&raster, &request.decoder);

        let bounds = match request.bounds {
            Some(b) => b,
            None => pixel_extent(&heightfield),
        };

        let mesh = tessellate(
            &heightfield,
            request.max_error,
            request.tesselator,
            &bounds,
        )?;

        Ok(Some(TileAssets {
            key: TileKey::WHOLE,
            mesh,
            texture,
        }))
    }

    /// Fetch elevation and texture concurrently; join both before the tile
    /// completes. Only the elevation result can fail the load.
    async fn fetch_pair(
        &self,
        elevation_url: &str,
        texture_url: Option<&str>,
    ) -> TerrainResult<(RgbaImage, Option<TextureAsset>)> {
        let elevation = self.fetcher.fetch(elevation_url);
        let texture = async {
            match texture_url {
                Some(url) => Some((url, self.fetcher.fetch(url).await)),
                None => None,
            }
        };
        let (elevation, texture) = tokio::join!(elevation, texture);

        let bytes = elevation?;
        let raster = image::load_from_memory(&bytes)
            .map_err(|e| TerrainError::decode(format!("{}: {}", elevation_url, e)))?
            .to_rgba8();

        let texture = match texture {
            Some((url, Ok(bytes))) => Some(TextureAsset {
                url: url.to_string(),
                bytes,
            }),
            Some((url, Err(e))) => {
                warn!("texture fetch failed, rendering with fallback color: {}: {}", url, e);
                None
            }
            None => None,
        };

        Ok((raster, texture))
    }
}

/// Default single-mesh bounds: the raster's pixel extent.
fn pixel_extent(field: &Heightfield) -> TileBounds {
    TileBounds::from_array([0.0, 0.0, field.width as f64, field.height as f64])
}
