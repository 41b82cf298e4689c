//! Region extraction
//!
//! Crops the axis-aligned bounding box of a token polygon out of the source
//! image, clamped to image bounds.

use image::{imageops, RgbImage};

/// Where a crop will come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropBounds {
    /// Half-open sub-rectangle of the image
    Region { x: u32, y: u32, width: u32, height: u32 },
    /// Box was degenerate after clamping; the whole image is used
    FullImage,
}

/// Compute the clamped bounding box of `polygon` within a `width` x `height` image
pub fn crop_bounds(width: u32, height: u32, polygon: &[(f32, f32)]) -> CropBounds {
    if width == 0 || height == 0 || polygon.is_empty() {
        return CropBounds::FullImage;
    }

    let (min_x, max_x) = extent(polygon.iter().map(|p| p.0));
    let (min_y, max_y) = extent(polygon.iter().map(|p| p.1));

    let x1 = clamp_coord(min_x, width - 1);
    let x2 = clamp_coord(max_x, width - 1);
    let y1 = clamp_coord(min_y, height - 1);
    let y2 = clamp_coord(max_y, height - 1);

    if x2 <= x1 || y2 <= y1 {
        return CropBounds::FullImage;
    }

    CropBounds::Region {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
    }
}

/// Crop the token region out of `image`, falling back to the whole image
pub fn crop(image: &RgbImage, polygon: &[(f32, f32)]) -> RgbImage {
    match crop_bounds(image.width(), image.height(), polygon) {
        CropBounds::Region { x, y, width, height } => {
            imageops::crop_imm(image, x, y, width, height).to_image()
        }
        CropBounds::FullImage => image.clone(),
    }
}

fn extent(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Floor a coordinate into `0..=max`
fn clamp_coord(value: f32, max: u32) -> u32 {
    // `as` saturates negatives and NaN to 0
    (value.floor() as u32).min(max)
}
