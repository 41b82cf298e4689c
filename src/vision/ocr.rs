//! OCR (Optical Character Recognition) engine interface
//!
//! The recognition engine is a black box: given an image region and an
//! optional character allowlist it returns recognized tokens.

use image::RgbImage;
use std::time::Duration;
use thiserror::Error;

use super::Token;

/// Options for a single recognition call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizeOptions {
    /// Restrict emitted characters to this set
    pub allowlist: Option<String>,
    /// Include polygons in the results
    pub detail: bool,
}

impl RecognizeOptions {
    /// Unconstrained recognition with full detail
    pub fn full() -> Self {
        Self {
            allowlist: None,
            detail: true,
        }
    }

    /// Recognition restricted to the given characters
    pub fn constrained(allowlist: impl Into<String>) -> Self {
        Self {
            allowlist: Some(allowlist.into()),
            detail: true,
        }
    }
}

/// Errors raised by a recognition engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("OCR backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input image: {0}")]
    InvalidInput(String),

    #[error("OCR backend failed: {0}")]
    Backend(String),

    #[error("recognition timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Capability implemented by every OCR backend
pub trait RecognitionEngine: Send + Sync {
    /// Engine identifier used in logs
    fn name(&self) -> &'static str;

    /// Recognize text in an image or cropped region
    fn recognize(&self, image: &RgbImage, options: &RecognizeOptions) -> Result<Vec<Token>, EngineError>;
}
