use std::sync::Arc;

use crate::config::Config;
use crate::directory::DirectorySource;
use crate::mail::MailTransport;
use crate::pipeline::Dashboards;
use crate::report::ReportDownloader;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Roster source. Sheets in production, CSV when `DIRECTORY_CSV_PATH` is set.
    pub directory: Arc<dyn DirectorySource>,
    pub mailer: Arc<dyn MailTransport>,
    pub downloader: Arc<dyn ReportDownloader>,
}

impl AppState {
    pub fn dashboards(&self) -> Dashboards {
        Dashboards {
            sc_url: self.config.sc_dashboard_url.clone(),
            grm_url: self.config.grm_dashboard_url.clone(),
            lang: self.config.dashboard_lang.clone(),
        }
    }
}
