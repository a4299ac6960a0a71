//! Resource fetching seam.
//!
//! The loader talks to tile servers through the `TileFetch` trait so tests
//! can substitute canned responses. The production implementation wraps a
//! `reqwest` client; `file://` URLs are served straight from the local
//! filesystem. No retry here: the consumer owns retry policy.

use log::debug;

use crate::error::{TerrainError, TerrainResult};
use crate::tiling::TileKey;

#[allow(async_fn_in_trait)]
pub trait TileFetch {
    /// Fetch a resource to bytes. Any non-success status is an error.
    async fn fetch(&self, url: &str) -> TerrainResult<Vec<u8>>;
}

/// HTTP fetcher with a fixed request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> TerrainResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl TileFetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> TerrainResult<Vec<u8>> {
        if let Some(path) = url.strip_prefix("file://") {
            let bytes = std::fs::read(path)?;
            debug!("read {} bytes from {}", bytes.len(), url);
            return Ok(bytes);
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TerrainError::http(format!(
                "GET {} failed with status {}",
                url,
                response.status()
            )));
        }
        let bytes = response.bytes().await?;
        debug!("fetched {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

/// Substitute a tile's coordinates into a URL template. Recognizes `{x}`,
/// `{y}`, `{z}` and the TMS-flipped `{-y}`.
pub fn expand_template(template: &str, key: TileKey) -> String {
    let flipped_y = (1u64 << key.zoom) - 1 - key.y as u64;
    template
        .replace("{x}", &key.x.to_string())
        .replace("{-y}", &flipped_y.to_string())
        .replace("{y}", &key.y.to_string())
        .replace("{z}", &key.zoom.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_substitutes_slippy_coordinates() {
        let key = TileKey::new(17, 11, 5);
        assert_eq!(
            expand_template("https://tiles.test/{z}/{x}/{y}.png", key),
            "https://tiles.test/5/17/11.png"
        );
    }

    #[test]
    fn tms_flip_inverts_y() {
        let key = TileKey::new(0, 0, 2);
        assert_eq!(
            expand_template("https://tiles.test/{z}/{x}/{-y}.png", key),
            "https://tiles.test/2/0/3.png"
        );
    }

    #[test]
    fn plain_urls_pass_through() {
        let key = TileKey::WHOLE;
        assert_eq!(
            expand_template("https://data.test/dem.png", key),
            "https://data.test/dem.png"
        );
    }
}
