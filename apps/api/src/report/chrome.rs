use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};
use url::Url;

use super::{report_path, DownloadError, ReportDownloader, ReportRequest};
use crate::models::Department;

/// Extra time the page gets to run its scripts before printing.
const RENDER_BUDGET_MS: u64 = 2_000;

/// Prints dashboard pages to PDF with a headless Chromium.
///
/// Each department prints its own report page: `SC` and `SC_TEST` share a
/// dashboard but not a page. Departments without a configured page print
/// whatever page the link opens on.
#[derive(Debug, Clone)]
pub struct ChromeDownloader {
    chrome_bin: String,
    output_dir: PathBuf,
    timeout: Duration,
    pages: HashMap<Department, String>,
}

impl ChromeDownloader {
    pub fn new(
        chrome_bin: String,
        output_dir: PathBuf,
        timeout: Duration,
        pages: HashMap<Department, String>,
    ) -> Self {
        Self {
            chrome_bin,
            output_dir,
            timeout,
            pages,
        }
    }

    /// The link, pointed at the department's report page.
    fn target_url(&self, request: &ReportRequest) -> Result<String, DownloadError> {
        match self.pages.get(&request.department) {
            Some(page) => page_url(&request.url, page),
            None => {
                warn!(
                    "No report page configured for {}; printing the landing page",
                    request.department
                );
                Ok(request.url.clone())
            }
        }
    }
}

/// Replaces (or appends) the `/page/{id}` tail of a dashboard URL, keeping
/// the query string.
fn page_url(link: &str, page: &str) -> Result<String, DownloadError> {
    let mut url = Url::parse(link).map_err(|_| DownloadError::InvalidUrl(link.to_string()))?;
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|s| s.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();
    if let Some(at) = segments.iter().position(|s| s == "page") {
        segments.truncate(at);
    }
    segments.push("page".to_string());
    segments.push(page.to_string());

    url.path_segments_mut()
        .map_err(|_| DownloadError::InvalidUrl(link.to_string()))?
        .clear()
        .extend(&segments);
    Ok(url.to_string())
}

#[async_trait]
impl ReportDownloader for ChromeDownloader {
    async fn download(&self, request: &ReportRequest) -> Result<PathBuf, DownloadError> {
        let path = report_path(&self.output_dir, request.department, &request.identity);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let url = self.target_url(request)?;
        if !request.headless {
            warn!("PDF printing needs a headless browser; ignoring headless=false");
        }

        info!("Opening website ({url})...");
        let child = Command::new(&self.chrome_bin)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg(format!("--virtual-time-budget={RENDER_BUDGET_MS}"))
            .arg(format!("--print-to-pdf={}", path.display()))
            .arg(&url)
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| DownloadError::Timeout(self.timeout.as_secs()))?
            .map_err(|source| DownloadError::Spawn {
                bin: self.chrome_bin.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DownloadError::Browser {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if !tokio::fs::try_exists(&path).await? {
            return Err(DownloadError::NoOutput(path));
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReportRequest {
        ReportRequest {
            url: "https://dash.example/report".to_string(),
            department: Department::Sc,
            identity: "ANA REYES".to_string(),
            headless: true,
        }
    }

    #[tokio::test]
    async fn test_missing_browser_binary() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ChromeDownloader::new(
            "/nonexistent/chromium".to_string(),
            dir.path().to_path_buf(),
            Duration::from_secs(5),
            HashMap::new(),
        );

        let err = downloader.download(&request()).await.unwrap_err();
        assert!(matches!(err, DownloadError::Spawn { .. }));
        assert!(dir.path().join("SC").is_dir());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_browser_that_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = ChromeDownloader::new(
            "true".to_string(),
            dir.path().to_path_buf(),
            Duration::from_secs(5),
            HashMap::new(),
        );

        let err = downloader.download(&request()).await.unwrap_err();
        assert!(matches!(err, DownloadError::NoOutput(_)));
    }

    fn paged_downloader() -> ChromeDownloader {
        let pages = HashMap::from([
            (Department::Sc, "p_sc".to_string()),
            (Department::ScTest, "p_sctest".to_string()),
        ]);
        ChromeDownloader::new(
            "chromium".to_string(),
            PathBuf::from("tmp/report_cards"),
            Duration::from_secs(5),
            pages,
        )
    }

    #[test]
    fn test_sc_and_sc_test_print_different_pages() {
        let downloader = paged_downloader();
        let mut sc = request();
        sc.url = "https://lookerstudio.google.com/reporting/abc123/page/p_landing?hl=en&params=%7B%7D"
            .to_string();
        let mut sc_test = sc.clone();
        sc_test.department = Department::ScTest;

        let sc_url = downloader.target_url(&sc).unwrap();
        let sc_test_url = downloader.target_url(&sc_test).unwrap();

        assert_ne!(sc_url, sc_test_url);
        assert_eq!(
            sc_url,
            "https://lookerstudio.google.com/reporting/abc123/page/p_sc?hl=en&params=%7B%7D"
        );
        assert_eq!(
            sc_test_url,
            "https://lookerstudio.google.com/reporting/abc123/page/p_sctest?hl=en&params=%7B%7D"
        );
    }

    #[test]
    fn test_page_is_appended_when_link_has_none() {
        assert_eq!(
            page_url("https://dash.example/reporting/abc123?hl=en", "p_sc").unwrap(),
            "https://dash.example/reporting/abc123/page/p_sc?hl=en"
        );
    }

    #[test]
    fn test_unconfigured_department_keeps_link() {
        let downloader = paged_downloader();
        let mut grm = request();
        grm.department = Department::Grm;
        assert_eq!(downloader.target_url(&grm).unwrap(), grm.url);
    }

    #[test]
    fn test_page_needs_a_real_url() {
        let err = page_url("not a url", "p_sc").unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
    }
}
