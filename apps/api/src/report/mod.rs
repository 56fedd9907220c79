//! Report download: turns dashboard links into PDF report cards on disk.
//!
//! Downloads are best-effort: a failed report is logged and counted, never
//! propagated to the caller.

pub mod chrome;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::models::{DashboardLink, Department};

pub use chrome::ChromeDownloader;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("could not start browser '{bin}': {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("browser exited with {status}: {stderr}")]
    Browser { status: String, stderr: String },

    #[error("page did not finish within {0}s")]
    Timeout(u64),

    #[error("browser reported success but {0} was not written")]
    NoOutput(PathBuf),

    #[error("cannot select a report page in '{0}'")]
    InvalidUrl(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub url: String,
    pub department: Department,
    pub identity: String,
    pub headless: bool,
}

#[async_trait]
pub trait ReportDownloader: Send + Sync {
    /// Saves the report behind `request.url` and returns where it landed.
    async fn download(&self, request: &ReportRequest) -> Result<PathBuf, DownloadError>;
}

/// `{root}/{DEPT}/{DEPT}_{identity}.pdf`, with path separators and control
/// characters in the identity replaced by `_`.
pub fn report_path(root: &Path, department: Department, identity: &str) -> PathBuf {
    let safe: String = identity
        .trim()
        .chars()
        .map(|c| {
            if c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    root.join(department.as_str())
        .join(format!("{}_{safe}.pdf", department.as_str()))
}

#[derive(Debug, Default, Serialize)]
pub struct ReportCardSummary {
    pub attempted: usize,
    pub saved: Vec<String>,
    pub failed: Vec<String>,
}

/// Downloads one report card per link, in order.
pub async fn download_report_cards(
    downloader: &dyn ReportDownloader,
    links: &[DashboardLink],
    department: Department,
    headless: bool,
) -> ReportCardSummary {
    let mut summary = ReportCardSummary::default();

    for link in links {
        summary.attempted += 1;
        info!("Generating report card for {}", link.employee_key);

        let request = ReportRequest {
            url: link.url.clone(),
            department,
            identity: link.employee_key.clone(),
            headless,
        };
        match downloader.download(&request).await {
            Ok(path) => {
                info!("Saved {}", path.display());
                summary.saved.push(path.display().to_string());
            }
            Err(e) => {
                error!("Error downloading report card for {}: {e}", link.employee_key);
                summary.failed.push(link.employee_key.clone());
            }
        }
    }

    summary
}
