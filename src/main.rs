use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tracktaste::config::{AppConfig, CliConfig, FileConfig};
use tracktaste::lastfm::{LastFmClient, NoopSimilaritySource, SimilaritySource};
use tracktaste::library_store::SqliteLibraryStore;
use tracktaste::recommendation::RecommendationEngine;

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite library database file.
    pub library_db: Option<PathBuf>,

    /// Path to a TOML config file; values there override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// User id to produce personalized recommendations for.
    #[clap(long)]
    pub user: Option<String>,

    /// Track id to find similar tracks for.
    #[clap(long)]
    pub similar_to: Option<String>,

    /// Maximum number of tracks to return.
    #[clap(long, default_value_t = 10)]
    pub limit: usize,

    /// Last.fm API key. Falls back to the LASTFM_API_KEY environment variable.
    #[clap(long)]
    pub lastfm_api_key: Option<String>,

    /// Timeout in seconds for Last.fm requests.
    #[clap(long, default_value_t = 30)]
    pub lastfm_timeout_sec: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };
    let cli_config = CliConfig {
        library_db: cli_args.library_db.clone(),
        lastfm_api_key: cli_args
            .lastfm_api_key
            .clone()
            .or_else(|| std::env::var("LASTFM_API_KEY").ok()),
        lastfm_timeout_sec: cli_args.lastfm_timeout_sec,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Opening SQLite library database at {:?}...", config.library_db);
    let library = Arc::new(SqliteLibraryStore::new(&config.library_db)?);

    let similarity: Arc<dyn SimilaritySource> = match &config.lastfm_api_key {
        Some(api_key) => Arc::new(LastFmClient::new(api_key, config.lastfm_timeout_sec)?),
        None => {
            info!("No Last.fm API key configured, external fallbacks disabled");
            Arc::new(NoopSimilaritySource)
        }
    };

    let engine = RecommendationEngine::with_weights(library, similarity, config.blend_weights);

    let tracks = match (&cli_args.user, &cli_args.similar_to) {
        (Some(user_id), None) => {
            engine
                .get_personalized_recommendations(user_id, cli_args.limit)
                .await?
        }
        (None, Some(track_id)) => engine.get_similar_tracks(track_id, cli_args.limit).await?,
        _ => bail!("Specify exactly one of --user or --similar-to"),
    };

    println!("{}", serde_json::to_string_pretty(&tracks)?);
    Ok(())
}
