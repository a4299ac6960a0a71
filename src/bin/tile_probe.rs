//! Fetch and tessellate a single terrain tile (or a whole raster) and print
//! mesh statistics. Exercises the full pipeline end to end:
//!
//!   tile_probe <elevation-url> [--zoom Z --x X --y Y] [--max-error E]
//!              [--tesselator auto|rtin|greedy] [--texture URL]
//!              [--decoder terrarium|grayscale]

use std::env;

use anyhow::{anyhow, Result};

use relief3d::{
    DecodeParams, ElevationSource, HttpFetcher, SingleLoadRequest, TerrainTileLoader,
    TesselatorKind, TileAssets, TileKey, TileLoadRequest,
};

struct ProbeArgs {
    elevation: String,
    texture: Option<String>,
    key: Option<TileKey>,
    max_error: f32,
    tesselator: TesselatorKind,
    decoder: DecodeParams,
}

fn parse_args() -> Result<ProbeArgs> {
    let mut args = env::args().skip(1);
    let elevation = args
        .next()
        .ok_or_else(|| anyhow!("usage: tile_probe <elevation-url> [options]"))?;

    let mut texture = None;
    let mut zoom = None;
    let mut x = None;
    let mut y = None;
    let mut max_error = 4.0f32;
    let mut tesselator = TesselatorKind::Auto;
    let mut decoder = DecodeParams::default();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| anyhow!("{} expects a value", name))
        };
        match arg.as_str() {
            "--texture" => texture = Some(value("--texture")?),
            "--zoom" => zoom = Some(value("--zoom")?.parse::<u32>()?),
            "--x" => x = Some(value("--x")?.parse::<u32>()?),
            "--y" => y = Some(value("--y")?.parse::<u32>()?),
            "--max-error" => max_error = value("--max-error")?.parse::<f32>()?,
            "--tesselator" => {
                tesselator = match value("--tesselator")?.as_str() {
                    "auto" => TesselatorKind::Auto,
                    "rtin" => TesselatorKind::Rtin,
                    "greedy" => TesselatorKind::Greedy,
                    other => return Err(anyhow!("unknown tesselator '{}'", other)),
                }
            }
            "--decoder" => {
                decoder = match value("--decoder")?.as_str() {
                    "terrarium" => DecodeParams::terrarium(),
                    "grayscale" => DecodeParams::grayscale(),
                    other => return Err(anyhow!("unknown decoder '{}'", other)),
                }
            }
            other => return Err(anyhow!("unknown argument '{}'", other)),
        }
    }

    let key = match (zoom, x, y) {
        (Some(z), Some(x), Some(y)) => Some(TileKey::new(x, y, z)),
        (None, None, None) => None,
        _ => return Err(anyhow!("--zoom, --x and --y must be given together")),
    };

    Ok(ProbeArgs {
        elevation,
        texture,
        key,
        max_error,
        tesselator,
        decoder,
    })
}

fn print_stats(assets: &TileAssets) {
    let bb = &assets.mesh.bounding_box;
    println!("tile       {:?}", assets.key);
    println!("vertices   {}", assets.mesh.vertex_count());
    println!("triangles  {}", assets.mesh.triangle_count());
    println!(
        "bounds     [{:.2}, {:.2}] x [{:.2}, {:.2}]",
        bb.min.x, bb.max.x, bb.min.y, bb.max.y
    );
    println!("z range    [{:.2}, {:.2}]", bb.min.z, bb.max.z);
    match &assets.texture {
        Some(t) => println!("texture    {} ({} bytes)", t.url, t.bytes.len()),
        None => println!("texture    absent"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let loader = TerrainTileLoader::new(HttpFetcher::new()?);
    let elevation = Some(ElevationSource::Url(args.elevation.clone()));

    let assets = match args.key {
        Some(key) => {
            loader
                .load_tile(&TileLoadRequest {
                    key,
                    elevation,
                    texture: args.texture,
                    decoder: args.decoder,
                    max_error: args.max_error,
                    tesselator: args.tesselator,
                    bounds_override: None,
                })
                .await?
        }
        None => {
            loader
                .load_single(&SingleLoadRequest {
                    elevation,
                    texture: args.texture,
                    decoder: args.decoder,
                    max_error: args.max_error,
                    tesselator: args.tesselator,
                    bounds: None,
                })
                .await?
        }
    };

    match assets {
        Some(assets) => print_stats(&assets),
        None => println!("no elevation data configured; nothing to load"),
    }
    Ok(())
}
