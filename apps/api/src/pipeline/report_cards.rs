use tracing::info;
use uuid::Uuid;

use super::{generate_employee_links, Dashboards, LinkQuery};
use crate::directory::DirectorySource;
use crate::errors::AppError;
use crate::report::{download_report_cards, ReportCardSummary, ReportDownloader};

/// Generates the queried links and downloads one report card per link.
///
/// Link errors abort the run; individual download failures only show up in
/// the summary.
pub async fn run_report_cards(
    directory: &dyn DirectorySource,
    downloader: &dyn ReportDownloader,
    dashboards: &Dashboards,
    query: &LinkQuery,
    headless: bool,
) -> Result<ReportCardSummary, AppError> {
    let run_id = Uuid::new_v4();
    let links = generate_employee_links(directory, dashboards, query).await?;
    info!(
        "Report card run {run_id}: downloading {} {} report cards",
        links.len(),
        query.department
    );

    let summary = download_report_cards(downloader, &links, query.department, headless).await;
    info!(
        "Report card run {run_id} done: {} saved, {} failed",
        summary.saved.len(),
        summary.failed.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Department, Period};
    use crate::test_support::{dashboards, roster, RecordingDownloader, StaticDirectory};

    fn query() -> LinkQuery {
        LinkQuery {
            department: Department::Sc,
            period: Period {
                year: 2025,
                month: 9,
            },
            name_keys: vec![],
            manager_email: None,
            limit: None,
        }
    }

    #[tokio::test]
    async fn test_limit_two_attempts_two_report_cards() {
        let directory = StaticDirectory(roster());
        let downloader = RecordingDownloader::default();
        let mut q = query();
        q.limit = Some(2);

        let summary = run_report_cards(&directory, &downloader, &dashboards(), &q, true)
            .await
            .unwrap();

        assert_eq!(summary.attempted, 2);
        let identities: Vec<_> = downloader.requests().into_iter().map(|r| r.identity).collect();
        assert_eq!(identities, vec!["ANA REYES", "BEN CRUZ"]);
    }

    #[tokio::test]
    async fn test_download_failures_do_not_abort() {
        let directory = StaticDirectory(roster());
        let downloader = RecordingDownloader::failing_for(&["ANA REYES"]);

        let summary = run_report_cards(&directory, &downloader, &dashboards(), &query(), false)
            .await
            .unwrap();

        assert_eq!(summary.attempted, 5);
        assert_eq!(summary.failed, vec!["ANA REYES".to_string()]);
        assert_eq!(summary.saved.len(), 4);
        assert!(downloader.requests().iter().all(|r| !r.headless));
    }
}
