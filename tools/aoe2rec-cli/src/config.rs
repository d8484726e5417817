//! aoe2rec.toml parsing
//!
//! Every table and key is optional. Command-line flags override the file.

use anyhow::{Context, Result};
use aoe2rec_core::ParseOptions;
use serde::Deserialize;
use std::path::Path;

use crate::output::Layout;

/// Config file looked up in the working directory when `--config` is absent
pub const CONFIG_FILE: &str = "aoe2rec.toml";

/// aoe2rec.toml structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub parse: ParseOptions,
    #[serde(default)]
    pub preprocess: PreprocessSection,
}

/// Batch conversion settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreprocessSection {
    /// File extensions treated as replays, without the dot.
    /// Default: mgz, aoe2record, rec
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Output layout. Default: events
    #[serde(default)]
    pub layout: Layout,

    /// Worker threads; 0 means one per CPU
    #[serde(default)]
    pub jobs: usize,
}

impl Default for PreprocessSection {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            layout: Layout::default(),
            jobs: 0,
        }
    }
}

fn default_extensions() -> Vec<String> {
    ["mgz", "aoe2record", "rec"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Parse config text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse aoe2rec.toml")
    }

    /// Load an explicit config file, or `aoe2rec.toml` from the working
    /// directory if present, or fall back to defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None if Path::new(CONFIG_FILE).is_file() => Path::new(CONFIG_FILE),
            None => return Ok(Self::default()),
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

impl PreprocessSection {
    /// Whether `path` has one of the configured extensions (case-insensitive)
    pub fn matches(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}
