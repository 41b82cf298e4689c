//! Result formatting
//!
//! Concise prints only the text, detailed adds confidence and polygon, JSON
//! emits the full token records.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::vision::Token;

/// Presentation mode for recognized tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// One line of text per token
    #[default]
    Concise,
    /// Text, confidence and polygon per token
    Detailed,
    /// Pretty-printed JSON array
    Json,
}

/// Render tokens in the requested format
pub fn render(tokens: &[Token], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Concise => render_concise(tokens),
        OutputFormat::Detailed => render_detailed(tokens),
        OutputFormat::Json => serde_json::to_string_pretty(tokens)?,
    })
}

fn render_concise(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_detailed(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| {
            format!(
                "{}\t(conf={:.3})\t(box={})",
                t.text,
                t.confidence,
                format_polygon(&t.region)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_polygon(polygon: &[(f32, f32)]) -> String {
    let points: Vec<String> = polygon
        .iter()
        .map(|(x, y)| format!("[{}, {}]", x, y))
        .collect();
    format!("[{}]", points.join(", "))
}
