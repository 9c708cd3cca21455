//! Visual previews of checked URLs.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use rand::Rng;
use std::io::Cursor;

use crate::error::{PhishguardError, Result};

/// Produces an opaque PNG preview for a URL.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    /// Encoded PNG bytes.
    async fn render(&self, url: &str) -> Result<Vec<u8>>;
}

/// Solid-colour placeholder standing in for a real page capture.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderPreview {
    width: u32,
    height: u32,
}

impl PlaceholderPreview {
    /// Create a placeholder renderer of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for PlaceholderPreview {
    fn default() -> Self {
        Self::new(200, 150)
    }
}

#[async_trait]
impl PreviewRenderer for PlaceholderPreview {
    async fn render(&self, _url: &str) -> Result<Vec<u8>> {
        let color = {
            let mut rng = rand::thread_rng();
            Rgb([rng.gen(), rng.gen(), rng.gen()])
        };
        let image = RgbImage::from_pixel(self.width, self.height, color);

        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| PhishguardError::Preview(e.to_string()))?;
        Ok(buffer.into_inner())
    }
}

/// Wrap PNG bytes as a `data:` URI for JSON responses.
pub fn to_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
