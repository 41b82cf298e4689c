//! Vision/OCR Layer
//!
//! Recognized tokens, the recognition engine seam and its backends.
//! Supported backends:
//! - Tesseract via the `tesseract` CLI

pub mod frame;
pub mod ocr;
pub mod tesseract;

use serde::{Deserialize, Serialize};

pub use frame::SourceImage;
pub use ocr::{EngineError, RecognitionEngine, RecognizeOptions};
pub use tesseract::TesseractEngine;

/// Polygon points in image pixel coordinates
pub type Polygon = Vec<(f32, f32)>;

/// One recognized unit of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Recognized text (may be empty)
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Bounding polygon, not necessarily closed
    pub region: Polygon,
}

impl Token {
    /// Create a new token
    pub fn new(text: impl Into<String>, confidence: f64, region: Polygon) -> Self {
        Self {
            text: text.into(),
            confidence,
            region,
        }
    }

    /// Replace the reading while carrying the geometry through unchanged
    pub fn with_reading(&self, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            region: self.region.clone(),
        }
    }
}

/// Convert a bounding box (x, y, width, height) to a clockwise polygon starting top-left
pub fn bounds_to_polygon(x: f32, y: f32, width: f32, height: f32) -> Polygon {
    vec![
        (x, y),
        (x + width, y),
        (x + width, y + height),
        (x, y + height),
    ]
}
