use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub library_db: Option<String>,
    pub lastfm_api_key: Option<String>,
    pub lastfm_timeout_sec: Option<u64>,

    // Blend weight overrides
    pub blend: Option<BlendConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct BlendConfig {
    pub collaborative: Option<f64>,
    pub content: Option<f64>,
    pub popular: Option<f64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
