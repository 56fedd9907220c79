//! In-memory collaborators for unit and route tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{Config, DirectoryConfig};
use crate::directory::{DirectoryError, DirectorySource};
use crate::mail::{MailError, MailTransport};
use crate::models::EmployeeRecord;
use crate::pipeline::Dashboards;
use crate::report::{report_path, DownloadError, ReportDownloader, ReportRequest};
use crate::state::AppState;

pub const SC_URL: &str = "https://dash.example/sc";
pub const GRM_URL: &str = "https://dash.example/grm";

pub fn dashboards() -> Dashboards {
    Dashboards {
        sc_url: SC_URL.to_string(),
        grm_url: GRM_URL.to_string(),
        lang: "en".to_string(),
    }
}

pub fn employee(first: &str, last: &str, email: &str, grm: &str, grm_email: &str, branch: &str) -> EmployeeRecord {
    EmployeeRecord {
        sc_firstname: first.to_string(),
        sc_lastname: last.to_string(),
        sc_email_address: email.to_string(),
        grm_name: grm.to_string(),
        grm_email_address: grm_email.to_string(),
        branch: branch.to_string(),
        ..Default::default()
    }
}

/// Five staff under two managers; Maria Santos also appears as staff.
pub fn roster() -> Vec<EmployeeRecord> {
    vec![
        employee("Juan", "Dela Cruz", "juan@x.com", "Maria Santos", "maria@x.com", "Shaw"),
        employee("Ana", "Reyes", "ana@x.com", "Maria Santos", "Maria@X.com", "Shaw"),
        employee("Ben", "Cruz", "ben@x.com", "Pedro Penduko", "pedro@x.com", "Batangas"),
        employee("Carl", "Lim", "carl@x.com", "Pedro Penduko", "pedro@x.com", "batangas"),
        employee("Maria", "Santos", "maria@x.com", "Pedro Penduko", "pedro@x.com", "Shaw"),
    ]
}

pub struct StaticDirectory(pub Vec<EmployeeRecord>);

#[async_trait]
impl DirectorySource for StaticDirectory {
    async fn fetch_rows(&self) -> Result<Vec<EmployeeRecord>, DirectoryError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail_for: Vec<String>,
}

impl RecordingMailer {
    pub fn failing_for(addresses: &[&str]) -> Self {
        Self {
            sent: Mutex::default(),
            fail_for: addresses.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn body_for(&self, address: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .find(|m| m.to.iter().any(|t| t == address))
            .map(|m| m.body)
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<String, MailError> {
        if to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        if to.iter().any(|t| self.fail_for.contains(t)) {
            return Err(MailError::Api {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMail {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(format!("msg-{}", sent.len()))
    }
}

#[derive(Default)]
pub struct RecordingDownloader {
    requests: Mutex<Vec<ReportRequest>>,
    fail_for: Vec<String>,
}

impl RecordingDownloader {
    pub fn failing_for(identities: &[&str]) -> Self {
        Self {
            requests: Mutex::default(),
            fail_for: identities.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportDownloader for RecordingDownloader {
    async fn download(&self, request: &ReportRequest) -> Result<PathBuf, DownloadError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_for.contains(&request.identity) {
            return Err(DownloadError::Timeout(30));
        }
        Ok(report_path(
            &PathBuf::from("tmp/report_cards"),
            request.department,
            &request.identity,
        ))
    }
}

pub fn test_config() -> Config {
    Config {
        sc_dashboard_url: SC_URL.to_string(),
        grm_dashboard_url: GRM_URL.to_string(),
        dashboard_lang: "en".to_string(),
        directory: DirectoryConfig::Csv {
            path: PathBuf::from("roster.csv"),
        },
        gmail_access_token: "token".to_string(),
        mail_sender: "hr@x.com".to_string(),
        test_emails: vec!["qa1@x.com".to_string(), "qa2@x.com".to_string()],
        report_output_dir: PathBuf::from("tmp/report_cards"),
        report_pages: HashMap::new(),
        chrome_bin: "chromium".to_string(),
        report_timeout_secs: 30,
        port: 8080,
        rust_log: "info".to_string(),
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub downloader: Arc<RecordingDownloader>,
}

pub fn harness(records: Vec<EmployeeRecord>) -> TestHarness {
    let mailer = Arc::new(RecordingMailer::default());
    let downloader = Arc::new(RecordingDownloader::default());
    let state = AppState {
        config: test_config(),
        directory: Arc::new(StaticDirectory(records)),
        mailer: mailer.clone(),
        downloader: downloader.clone(),
    };
    TestHarness {
        state,
        mailer,
        downloader,
    }
}
