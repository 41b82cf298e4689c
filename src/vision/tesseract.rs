//! Tesseract OCR backend
//!
//! Drives the `tesseract` CLI through `rusty_tesseract`. Word-level rows of the
//! TSV output become tokens; a constrained pass sets `tessedit_char_whitelist`.

use image::{ImageFormat, RgbImage};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use tracing::{debug, info};

use super::ocr::{EngineError, RecognitionEngine, RecognizeOptions};
use super::{bounds_to_polygon, Token};

/// TSV row level for individual words
const WORD_LEVEL: i32 = 5;

/// Tesseract config variable restricting emitted characters
const WHITELIST_VARIABLE: &str = "tessedit_char_whitelist";

/// Tesseract engine wrapper
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    /// Tesseract language spec, e.g. "eng+deu"
    lang: String,
    /// Page segmentation mode
    psm: i32,
    /// OCR engine mode
    oem: i32,
}

impl TesseractEngine {
    /// Create an engine for the given languages (short or Tesseract codes)
    pub fn new(languages: &[String], psm: u32, oem: u32) -> Result<Self, EngineError> {
        let codes: Vec<String> = languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(tesseract_language)
            .collect();

        if codes.is_empty() {
            return Err(EngineError::Unavailable("no languages specified".to_string()));
        }

        let lang = codes.join("+");
        info!("Tesseract engine configured: lang={}, psm={}, oem={}", lang, psm, oem);

        Ok(Self {
            lang,
            psm: psm as i32,
            oem: oem as i32,
        })
    }

    /// Tesseract language spec
    pub fn language(&self) -> &str {
        &self.lang
    }

    fn args(&self, options: &RecognizeOptions) -> Args {
        let mut config_variables = HashMap::new();
        if let Some(allowlist) = &options.allowlist {
            config_variables.insert(WHITELIST_VARIABLE.to_string(), allowlist.clone());
        }

        Args {
            lang: self.lang.clone(),
            config_variables,
            psm: Some(self.psm),
            dpi: None,
            oem: Some(self.oem),
        }
    }
}

impl RecognitionEngine for TesseractEngine {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize(&self, image: &RgbImage, options: &RecognizeOptions) -> Result<Vec<Token>, EngineError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidInput(format!("empty image {}x{}", width, height)));
        }

        // rusty_tesseract reads from disk, so hand the region over as a PNG
        let file = tempfile::Builder::new()
            .prefix("ocr-disambiguate-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;

        let input = Image::from_path(file.path())
            .map_err(|e| EngineError::Backend(format!("{:?}", e)))?;
        let output = rusty_tesseract::image_to_data(&input, &self.args(options))
            .map_err(|e| EngineError::Backend(format!("{:?}", e)))?;

        let tokens: Vec<Token> = output
            .data
            .iter()
            .filter_map(|row| {
                WordRow {
                    level: row.level,
                    left: row.left,
                    top: row.top,
                    width: row.width,
                    height: row.height,
                    conf: row.conf,
                    text: &row.text,
                }
                .into_token(options.detail)
            })
            .collect();

        debug!(
            "Tesseract recognized {} words in {}x{} image (allowlist: {:?})",
            tokens.len(),
            width,
            height,
            options.allowlist
        );

        Ok(tokens)
    }
}

/// One row of Tesseract's TSV output
#[derive(Debug, Clone, Copy)]
struct WordRow<'a> {
    level: i32,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    /// Confidence in 0-100, negative for non-word rows
    conf: f32,
    text: &'a str,
}

impl WordRow<'_> {
    /// Convert a word row to a token; structural rows and blanks yield `None`
    fn into_token(self, detail: bool) -> Option<Token> {
        let text = self.text.trim();
        if self.level != WORD_LEVEL || text.is_empty() || self.conf < 0.0 {
            return None;
        }

        let region = if detail {
            bounds_to_polygon(
                self.left as f32,
                self.top as f32,
                self.width as f32,
                self.height as f32,
            )
        } else {
            Vec::new()
        };

        Some(Token::new(text, (f64::from(self.conf) / 100.0).clamp(0.0, 1.0), region))
    }
}

/// Map short language codes to Tesseract's three-letter codes
fn tesseract_language(code: &str) -> String {
    match code {
        "en" => "eng",
        "de" => "deu",
        "fr" => "fra",
        "es" => "spa",
        "it" => "ita",
        "pt" => "por",
        "nl" => "nld",
        other => other,
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(level: i32, conf: f32, text: &str) -> WordRow<'_> {
        WordRow {
            level,
            left: 10,
            top: 20,
            width: 30,
            height: 8,
            conf,
            text,
        }
    }

    #[test]
    fn test_language_mapping() {
        assert_eq!(tesseract_language("en"), "eng");
        assert_eq!(tesseract_language("de"), "deu");
        assert_eq!(tesseract_language("chi_sim"), "chi_sim");
    }

    #[test]
    fn test_engine_joins_languages() {
        let engine = TesseractEngine::new(&["en".to_string(), " fr ".to_string()], 6, 1).unwrap();
        assert_eq!(engine.language(), "eng+fra");
        assert_eq!(engine.name(), "tesseract");
    }

    #[test]
    fn test_engine_requires_language() {
        let result = TesseractEngine::new(&[" ".to_string()], 6, 1);
        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }

    #[test]
    fn test_args_whitelist() {
        let engine = TesseractEngine::new(&["en".to_string()], 7, 1).unwrap();

        let args = engine.args(&RecognizeOptions::constrained("058BOS"));
        assert_eq!(args.lang, "eng");
        assert_eq!(args.psm, Some(7));
        assert_eq!(args.oem, Some(1));
        assert_eq!(
            args.config_variables.get(WHITELIST_VARIABLE).map(String::as_str),
            Some("058BOS")
        );

        let args = engine.args(&RecognizeOptions::full());
        assert!(args.config_variables.is_empty());
    }

    #[test]
    fn test_word_row_to_token() {
        let token = row(5, 87.5, "B00K").into_token(true).unwrap();
        assert_eq!(token.text, "B00K");
        assert!((token.confidence - 0.875).abs() < 1e-6);
        assert_eq!(
            token.region,
            vec![(10.0, 20.0), (40.0, 20.0), (40.0, 28.0), (10.0, 28.0)]
        );
    }

    #[test]
    fn test_word_row_without_detail() {
        let token = row(5, 50.0, "S5").into_token(false).unwrap();
        assert!(token.region.is_empty());
    }

    #[test]
    fn test_non_word_rows_skipped() {
        assert!(row(4, 95.0, "line").into_token(true).is_none());
        assert!(row(5, -1.0, "x").into_token(true).is_none());
        assert!(row(5, 90.0, "   ").into_token(true).is_none());
    }
}
