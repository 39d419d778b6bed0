mod file_config;

pub use file_config::{BlendConfig, FileConfig};

use crate::lastfm::DEFAULT_TIMEOUT_SECS;
use crate::recommendation::BlendWeights;
use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub library_db: Option<PathBuf>,
    pub lastfm_api_key: Option<String>,
    pub lastfm_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            library_db: None,
            lastfm_api_key: None,
            lastfm_timeout_sec: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub library_db: PathBuf,
    pub lastfm_api_key: Option<String>,
    pub lastfm_timeout_sec: u64,
    pub blend_weights: BlendWeights,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let library_db = file
            .library_db
            .map(PathBuf::from)
            .or_else(|| cli.library_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("library_db must be specified via CLI or in config file")
            })?;

        let lastfm_api_key = file.lastfm_api_key.or_else(|| cli.lastfm_api_key.clone());
        let lastfm_timeout_sec = file.lastfm_timeout_sec.unwrap_or(cli.lastfm_timeout_sec);

        let defaults = BlendWeights::default();
        let blend = file.blend.unwrap_or_default();
        let blend_weights = BlendWeights {
            collaborative: blend.collaborative.unwrap_or(defaults.collaborative),
            content: blend.content.unwrap_or(defaults.content),
            popular: blend.popular.unwrap_or(defaults.popular),
        };
        if blend_weights.collaborative < 0.0
            || blend_weights.content < 0.0
            || blend_weights.popular < 0.0
        {
            bail!("Blend weights must be non-negative");
        }

        Ok(AppConfig {
            library_db,
            lastfm_api_key,
            lastfm_timeout_sec,
            blend_weights,
        })
    }
}
