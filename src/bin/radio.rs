//! Radio station server
//!
//! Reads the track list (one path per line) from stdin or from the
//! configured playlist file, then serves random tracks to every client.
//!
//! Usage: `radio [config.toml] < tracks.txt`

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use random_radio::{config::AppConfig, network::StationServer, tracks::TrackList};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting radio station");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    let tracks = match &config.playlist {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Cannot open playlist {}", path.display()))?;
            TrackList::from_reader(BufReader::new(file))
        }
        None => {
            tracing::info!("Reading track list from stdin");
            TrackList::from_reader(std::io::stdin().lock())
        }
    }
    .context("Failed to load track list")?;

    tracing::info!("Loaded {} tracks", tracks.len());

    let server = StationServer::bind(&config.server, config.station.clone(), Arc::new(tracks))
        .context("Failed to start listener")?;

    tracing::info!(
        "Station \"{}\" on http://{}",
        config.station.name,
        server.local_addr()?
    );

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Ctrl+C handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Stopped");
    Ok(())
}
