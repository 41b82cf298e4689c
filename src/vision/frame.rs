//! Source image loaded from disk

use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// A decoded source image
#[derive(Debug)]
pub struct SourceImage {
    /// RGB pixel data
    pixels: RgbImage,
    /// File the image was read from
    path: PathBuf,
}

impl SourceImage {
    /// Decode an image file into an RGB buffer
    pub fn open(path: &Path) -> Result<Self> {
        let pixels = image::open(path)
            .with_context(|| format!("Failed to open image: {:?}", path))?
            .to_rgb8();

        Ok(Self {
            pixels,
            path: path.to_path_buf(),
        })
    }

    /// Pixel buffer
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Path the image was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}
