use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::models::Department;

/// Where the roster is read from.
#[derive(Debug, Clone)]
pub enum DirectoryConfig {
    Sheets {
        spreadsheet_id: String,
        range: String,
        access_token: String,
    },
    Csv {
        path: PathBuf,
    },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub sc_dashboard_url: String,
    pub grm_dashboard_url: String,
    pub dashboard_lang: String,
    pub directory: DirectoryConfig,
    pub gmail_access_token: String,
    pub mail_sender: String,
    pub test_emails: Vec<String>,
    pub report_output_dir: PathBuf,
    /// Dashboard page printed for each department, e.g. `SC=p_abc,SC_TEST=p_def`.
    pub report_pages: HashMap<Department, String>,
    pub chrome_bin: String,
    pub report_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let directory = match std::env::var("DIRECTORY_CSV_PATH") {
            Ok(path) if !path.trim().is_empty() => DirectoryConfig::Csv {
                path: PathBuf::from(path),
            },
            _ => DirectoryConfig::Sheets {
                spreadsheet_id: require_env("SHEETS_SPREADSHEET_ID")?,
                range: optional_env("SHEETS_RANGE", "Sheet1!A1:G134"),
                access_token: require_env("SHEETS_ACCESS_TOKEN")?,
            },
        };

        Ok(Config {
            sc_dashboard_url: require_env("SC_DASHBOARD_URL")?,
            grm_dashboard_url: require_env("GRM_DASHBOARD_URL")?,
            dashboard_lang: optional_env("DASHBOARD_LANG", "en"),
            directory,
            gmail_access_token: require_env("GMAIL_ACCESS_TOKEN")?,
            mail_sender: require_env("MAIL_SENDER")?,
            test_emails: parse_list(&optional_env("TEST_EMAILS", "")),
            report_output_dir: PathBuf::from(optional_env("REPORT_OUTPUT_DIR", "./tmp/report_cards")),
            report_pages: parse_report_pages(&optional_env("REPORT_PAGES", ""))?,
            chrome_bin: optional_env("CHROME_BIN", "chromium"),
            report_timeout_secs: optional_env("REPORT_TIMEOUT_SECS", "30")
                .parse::<u64>()
                .context("REPORT_TIMEOUT_SECS must be a whole number of seconds")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma-separated list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses `DEPT=page_id` pairs separated by commas.
pub fn parse_report_pages(raw: &str) -> Result<HashMap<Department, String>> {
    let mut pages = HashMap::new();
    for entry in parse_list(raw) {
        let Some((tag, page)) = entry.split_once('=') else {
            bail!("REPORT_PAGES entry '{entry}' is not of the form DEPT=page_id");
        };
        let Some(department) = Department::from_tag(tag) else {
            bail!("REPORT_PAGES names unknown department '{tag}'");
        };
        let page = page.trim();
        if page.is_empty() {
            bail!("REPORT_PAGES entry for {department} has no page id");
        }
        pages.insert(department, page.to_string());
    }
    Ok(pages)
}
