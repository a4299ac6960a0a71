//! Raster elevation decoding.
//!
//! A height sample is an affine combination of a pixel's color channels:
//! `h = r * r_scaler + g * g_scaler + b * b_scaler + offset`. The scalers
//! cover the common web-elevation encodings (terrarium-style split-channel,
//! single-channel grayscale) without special-casing either.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Linear pixel-to-height decode coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodeParams {
    pub r_scaler: f32,
    pub g_scaler: f32,
    pub b_scaler: f32,
    pub offset: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        // height = red channel
        Self {
            r_scaler: 1.0,
            g_scaler: 0.0,
            b_scaler: 0.0,
            offset: 0.0,
        }
    }
}

impl DecodeParams {
    /// Terrarium-style split-channel encoding with a -32768 m floor.
    pub fn terrarium() -> Self {
        Self {
            r_scaler: 256.0,
            g_scaler: 1.0,
            b_scaler: 1.0 / 256.0,
            offset: -32768.0,
        }
    }

    /// Single-channel grayscale encoding (height = red).
    pub fn grayscale() -> Self {
        Self::default()
    }

    /// Decode one pixel's channels into a height in meters.
    #[inline]
    pub fn decode(&self, r: f32, g: f32, b: f32) -> f32 {
        r * self.r_scaler + g * self.g_scaler + b * self.b_scaler + self.offset
    }
}

/// Regular grid of elevation samples, row-major with row 0 at the raster's
/// top (north) edge. Built once from a decoded raster and consumed by
/// tessellation.
#[derive(Debug, Clone)]
pub struct Heightfield {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<f32>,
}

impl Heightfield {
    pub fn new(width: u32, height: u32, samples: Vec<f32>) -> Self {
        debug_assert_eq!(samples.len(), (width * height) as usize);
        Self {
            width,
            height,
            samples,
        }
    }

    #[inline]
    pub fn sample(&self, x: u32, y: u32) -> f32 {
        self.samples[(y * self.width + x) as usize]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Single-pass min/max scan; `None` for an empty field.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        if self.samples.is_empty() {
            return None;
        }
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for &v in &self.samples {
            if v < lo {
                lo = v;
            }
            if v > hi {
                hi = v;
            }
        }
        Some((lo, hi))
    }
}

/// Apply the decoder to every pixel of an RGBA raster.
pub fn decode_raster(raster: &RgbaImage, params: &DecodeParams) -> Heightfield {
    let (width, height) = raster.dimensions();
    let mut samples = Vec::with_capacity((width * height) as usize);
    for pixel in raster.pixels() {
        let [r, g, b, _a] = pixel.0;
        samples.push(params.decode(r as f32, g as f32, b as f32));
    }
    Heightfield::new(width, height, samples)
}
