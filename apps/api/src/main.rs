mod config;
mod directory;
mod errors;
mod links;
mod mail;
mod matching;
mod models;
mod pipeline;
mod report;
mod routes;
mod state;
mod templates;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, DirectoryConfig};
use crate::directory::{CsvDirectory, DirectorySource, SheetsDirectory};
use crate::mail::GmailClient;
use crate::report::ChromeDownloader;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Report Card API v{}", env!("CARGO_PKG_VERSION"));

    let directory = build_directory(&config);

    let mailer = Arc::new(GmailClient::new(
        config.mail_sender.clone(),
        config.gmail_access_token.clone(),
    ));
    info!("Gmail client initialized (sender: {})", config.mail_sender);

    let downloader = Arc::new(ChromeDownloader::new(
        config.chrome_bin.clone(),
        config.report_output_dir.clone(),
        Duration::from_secs(config.report_timeout_secs),
        config.report_pages.clone(),
    ));
    info!(
        "Report downloader: {} -> {}",
        config.chrome_bin,
        config.report_output_dir.display()
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        directory,
        mailer,
        downloader,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the roster source named by the configuration.
fn build_directory(config: &Config) -> Arc<dyn DirectorySource> {
    match &config.directory {
        DirectoryConfig::Csv { path } => {
            info!("Directory source: CSV file {}", path.display());
            Arc::new(CsvDirectory::new(path.clone()))
        }
        DirectoryConfig::Sheets {
            spreadsheet_id,
            range,
            access_token,
        } => {
            info!("Directory source: spreadsheet {spreadsheet_id} ({range})");
            Arc::new(SheetsDirectory::new(
                spreadsheet_id.clone(),
                range.clone(),
                access_token.clone(),
            ))
        }
    }
}
