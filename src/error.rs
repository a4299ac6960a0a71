//! Central error handling for the terrain streaming pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrainError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Raster decode failed: {0}")]
    Decode(String),

    #[error("Tessellation failed: {0}")]
    Tessellation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl TerrainError {
    /// Convenience constructors for string-carrying variants.
    pub fn http<T: ToString>(msg: T) -> Self {
        TerrainError::Http(msg.to_string())
    }

    pub fn decode<T: ToString>(msg: T) -> Self {
        TerrainError::Decode(msg.to_string())
    }

    pub fn tessellation<T: ToString>(msg: T) -> Self {
        TerrainError::Tessellation(msg.to_string())
    }
}

impl From<reqwest::Error> for TerrainError {
    fn from(e: reqwest::Error) -> Self {
        TerrainError::Http(e.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type TerrainResult<T> = Result<T, TerrainError>;
