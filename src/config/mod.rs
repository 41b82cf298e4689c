//! Application Configuration
//!
//! User settings stored in TOML format. Every section has defaults so a
//! partial file is enough.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::disambiguation::{ConfusableTable, ReconcilePolicy, DEFAULT_MARGIN};
use crate::output::OutputFormat;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recognition engine settings
    pub engine: EngineConfig,
    /// Second-pass settings
    pub disambiguation: DisambiguationConfig,
    /// Output settings
    pub output: OutputConfig,
}

impl AppConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let d = &self.disambiguation;
        if !d.margin.is_finite() || d.margin < 0.0 {
            bail!("disambiguation.margin must be a non-negative number, got {}", d.margin);
        }
        if d.workers == 0 {
            bail!("disambiguation.workers must be at least 1");
        }
        if d.timeout_ms == Some(0) {
            bail!("disambiguation.timeout_ms must be greater than 0");
        }
        Ok(())
    }
}

/// Recognition engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Languages for the first pass (e.g. "en", "de")
    pub languages: Vec<String>,
    /// Tesseract page segmentation mode
    pub psm: u32,
    /// Tesseract OCR engine mode
    pub oem: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            psm: 6,
            oem: 1,
        }
    }
}

impl EngineConfig {
    /// Languages with blanks removed
    pub fn language_list(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Second-pass settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisambiguationConfig {
    /// Run the second pass at all
    pub enabled: bool,
    /// Confidence margin between a clear win and a near-tie
    pub margin: f64,
    /// Candidate reconciliation policy
    pub policy: ReconcilePolicy,
    /// Concurrent second-pass calls
    pub workers: usize,
    /// Per-call timeout in milliseconds
    pub timeout_ms: Option<u64>,
    /// Custom confusable groups, one string of characters per group
    pub groups: Option<Vec<String>>,
}

impl Default for DisambiguationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            margin: DEFAULT_MARGIN,
            policy: ReconcilePolicy::default(),
            workers: 1,
            timeout_ms: None,
            groups: None,
        }
    }
}

impl DisambiguationConfig {
    /// Per-call timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Confusable table: custom groups if configured, built-in otherwise
    pub fn confusable_table(&self) -> ConfusableTable {
        match &self.groups {
            Some(groups) => ConfusableTable::from_groups(groups),
            None => ConfusableTable::builtin().clone(),
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Presentation mode
    pub format: OutputFormat,
}

/// Read and parse a TOML configuration file; missing sections take defaults
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read configuration {:?}", path))?;
    toml::from_str(&text).with_context(|| format!("Invalid configuration in {:?}", path))
}

/// Write the configuration as TOML, creating the parent directory if needed
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create configuration directory {:?}", parent))?;
    }
    let text = toml::to_string_pretty(config).context("Cannot serialize configuration")?;
    std::fs::write(path, text).with_context(|| format!("Cannot write configuration {:?}", path))
}

/// Default configuration file location
pub fn default_config_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "ocr-disambiguate", "ocr-disambiguate")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.engine.languages, vec!["en".to_string()]);
        assert_eq!(config.engine.psm, 6);
        assert_eq!(config.engine.oem, 1);

        assert!(!config.disambiguation.enabled);
        assert!((config.disambiguation.margin - 0.1).abs() < 1e-6);
        assert_eq!(config.disambiguation.policy, ReconcilePolicy::Sequential);
        assert_eq!(config.disambiguation.workers, 1);
        assert!(config.disambiguation.timeout().is_none());
        assert!(config.disambiguation.groups.is_none());

        assert_eq!(config.output.format, OutputFormat::Concise);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let mut config = AppConfig::default();
        config.disambiguation.enabled = true;
        config.disambiguation.policy = ReconcilePolicy::GlobalBest;
        config.disambiguation.timeout_ms = Some(1500);
        config.output.format = OutputFormat::Json;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert!(parsed.disambiguation.enabled);
        assert_eq!(parsed.disambiguation.policy, ReconcilePolicy::GlobalBest);
        assert_eq!(parsed.disambiguation.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(parsed.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_partial_config() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [disambiguation]
            enabled = true
            policy = "global_best"
            groups = ["O0Q", "rn"]
            "#,
        )
        .unwrap();

        assert!(parsed.disambiguation.enabled);
        assert_eq!(parsed.disambiguation.policy, ReconcilePolicy::GlobalBest);
        assert_eq!(parsed.disambiguation.workers, 1);
        assert_eq!(parsed.engine.psm, 6);

        let table = parsed.disambiguation.confusable_table();
        assert_eq!(table.groups().len(), 2);
        assert!(table.is_ambiguous("Q"));
        assert!(!table.is_ambiguous("5"));
    }

    #[test]
    fn test_language_list_skips_blanks() {
        let engine = EngineConfig {
            languages: vec![" en ".to_string(), "".to_string(), "de".to_string()],
            ..Default::default()
        };
        assert_eq!(engine.language_list(), vec!["en".to_string(), "de".to_string()]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.disambiguation.workers = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.disambiguation.margin = -0.2;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.disambiguation.timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AppConfig::default();
        config.engine.languages = vec!["en".to_string(), "fr".to_string()];

        let temp_file = NamedTempFile::new().unwrap();
        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(loaded.engine.languages, config.engine.languages);
        assert_eq!(loaded.disambiguation.workers, config.disambiguation.workers);
    }

    #[test]
    fn test_missing_config_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let message = format!("{:#}", load_config(&path).unwrap_err());
        assert!(message.contains("absent.toml"), "{}", message);
    }

    #[test]
    fn test_mistyped_value_names_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[disambiguation]\nworkers = \"many\"").unwrap();

        let message = format!("{:#}", load_config(file.path()).unwrap_err());
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(message.contains("Invalid configuration"), "{}", message);
        assert!(message.contains(&name), "{}", message);
    }

    #[test]
    fn test_save_config_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.disambiguation.enabled = true;
        save_config(&config, &path).unwrap();

        assert!(load_config(&path).unwrap().disambiguation.enabled);
    }
}
