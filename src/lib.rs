//! ocr-disambiguate - OCR with a second pass for confusable characters
//!
//! Recognizes text in an image, then optionally re-reads tokens containing
//! visually confusable characters (O/0, I/1/l, ...) with a restricted
//! character set and keeps the better reading.
//!
//! - [`vision`]: tokens, the recognition engine trait and the Tesseract backend
//! - [`disambiguation`]: ambiguity detection, allowlists, cropping, scoring and
//!   the [`Disambiguator`] that drives the second pass
//! - [`config`]: TOML settings
//! - [`output`]: concise, detailed and JSON rendering

pub mod config;
pub mod disambiguation;
pub mod output;
pub mod vision;

pub use config::AppConfig;
pub use disambiguation::{disambiguate, Disambiguator};
pub use vision::{RecognitionEngine, RecognizeOptions, Token};
