use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{fetch_roster, links_for, narrow, scope_to_manager, Dashboards, LinkQuery};
use crate::directory::DirectorySource;
use crate::errors::AppError;
use crate::links::generator::managed_links;
use crate::links::grouping::group_by_manager;
use crate::mail::MailTransport;
use crate::matching::matcher::{match_recipients, LinkLookup};
use crate::matching::recipients::build_recipients;
use crate::models::{Department, EmployeeRecord, Period};
use crate::templates::{self, emails, format_managed_links, render, TemplateContext, TemplateId};

#[derive(Debug, Clone)]
pub struct NotifyRequest {
    pub query: LinkQuery,
    /// Template override; defaults to the department tag.
    pub template: Option<String>,
}

/// Terminal outcome of a notification run.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub run_id: Uuid,
    pub sent: Vec<String>,
    pub skipped: Vec<EmployeeRecord>,
    pub completed_at: DateTime<Utc>,
}

/// Runs the whole notification pipeline.
///
/// Rows without an address, recipients without a matching link and failed
/// sends all end up in `skipped`; only roster and link errors abort the run.
pub async fn send_notifications(
    directory: &dyn DirectorySource,
    mailer: &dyn MailTransport,
    dashboards: &Dashboards,
    request: &NotifyRequest,
) -> Result<DispatchReport, AppError> {
    let run_id = Uuid::new_v4();
    let query = &request.query;
    let department = query.department;
    info!("Notification run {run_id} started ({department})");

    let records = fetch_roster(directory).await?;
    let (audience, link_rows) = match query.manager_email.as_deref() {
        Some(email) => {
            let scope = scope_to_manager(records, email)?;
            let link_rows = scope.with_manager();
            (scope.reports, link_rows)
        }
        None => (records.clone(), records),
    };

    let links = narrow(links_for(&link_rows, dashboards, department, query.period)?, query);
    let recipients = build_recipients(&audience, department);
    let mut skipped = recipients.skipped;
    info!(
        "Matching {} recipients against {} links",
        recipients.recipients.len(),
        links.len()
    );

    let outcome = match_recipients(recipients.recipients, LinkLookup::new(links));
    skipped.extend(outcome.skipped);

    let rosters = if department.is_manager() {
        managed_blocks(&link_rows, dashboards, query.period)?
    } else {
        HashMap::new()
    };

    let template = TemplateId::parse(request.template.as_deref().or(Some(department.as_str())));
    let subject = templates::subject(query.period);
    let mut sent = Vec::new();

    for (recipient, link) in outcome.matched {
        let context = TemplateContext {
            first_name: Some(recipient.first_name.clone()),
            last_name: Some(recipient.last_name.clone()),
            month: Some(query.period.month),
            year: Some(query.period.year),
            url: Some(link.url.clone()),
            branch: Some(link.branch.clone()),
            managed_links: rosters.get(&recipient.email).cloned(),
        };
        let body = render(template, &context);

        match mailer.send(&[recipient.email.clone()], &subject, &body).await {
            Ok(message_id) => {
                info!("Sent report card link to {} ({message_id})", recipient.email);
                sent.push(recipient.email);
            }
            Err(e) => {
                warn!("Failed to send to {}: {e}", recipient.email);
                skipped.push(recipient.source);
            }
        }
    }

    info!(
        "Notification run {run_id} finished: {} sent, {} skipped",
        sent.len(),
        skipped.len()
    );
    Ok(DispatchReport {
        run_id,
        sent,
        skipped,
        completed_at: Utc::now(),
    })
}

/// Per manager email, the formatted staff links of everyone reporting to
/// them, minus the manager's own link.
fn managed_blocks(
    records: &[EmployeeRecord],
    dashboards: &Dashboards,
    period: Period,
) -> Result<HashMap<String, String>, AppError> {
    let mut blocks = HashMap::new();

    for (manager_email, group) in group_by_manager(records) {
        if manager_email.is_empty() {
            continue;
        }
        let manager_name = group[0].grm_name.clone();
        let staff_links = links_for(&group, dashboards, Department::Sc, period)?;
        let roster = managed_links(&staff_links, &manager_name);
        blocks.insert(manager_email, format_managed_links(&roster));
    }

    Ok(blocks)
}

/// Sends the fixed test message to the configured test addresses.
pub async fn send_test_email(mailer: &dyn MailTransport, recipients: &[String]) -> Result<String, AppError> {
    if recipients.is_empty() {
        return Err(AppError::Validation(
            "No test recipients configured (TEST_EMAILS)".to_string(),
        ));
    }
    Ok(mailer.send(recipients, emails::TEST_SUBJECT, emails::TEST_BODY).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dashboards, employee, roster, RecordingMailer, StaticDirectory};

    fn request(department: Department) -> NotifyRequest {
        NotifyRequest {
            query: LinkQuery {
                department,
                period: Period {
                    year: 2025,
                    month: 9,
                },
                name_keys: vec![],
                manager_email: None,
                limit: None,
            },
            template: None,
        }
    }

    #[tokio::test]
    async fn test_staff_run_sends_one_mail_per_recipient() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::default();

        let report = send_notifications(&directory, &mailer, &dashboards(), &request(Department::Sc))
            .await
            .unwrap();

        assert_eq!(report.sent.len(), 5);
        assert!(report.skipped.is_empty());
        let body = mailer.body_for("juan@x.com").unwrap();
        assert!(body.starts_with("Hi Juan Dela Cruz,"));
        assert!(body.contains("September 2025"));
        assert_eq!(
            mailer.sent()[0].subject,
            "Performance Report Card - September 2025"
        );
    }

    #[tokio::test]
    async fn test_limit_skips_recipients_beyond_matched_links() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::default();
        let mut req = request(Department::Sc);
        req.query.limit = Some(2);

        let report = send_notifications(&directory, &mailer, &dashboards(), &req)
            .await
            .unwrap();

        assert_eq!(report.sent, vec!["ana@x.com", "ben@x.com"]);
        assert_eq!(report.skipped.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_addresses_get_one_mail() {
        let mut records = roster();
        records.push(employee("Juan", "Dela Cruz", "JUAN@X.COM", "Maria Santos", "maria@x.com", "Shaw"));
        let directory = StaticDirectory(records);
        let mailer = RecordingMailer::default();

        let report = send_notifications(&directory, &mailer, &dashboards(), &request(Department::Sc))
            .await
            .unwrap();

        let to_juan = report.sent.iter().filter(|e| *e == "juan@x.com").count();
        assert_eq!(to_juan, 1);
        assert_eq!(mailer.sent().len(), 5);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_skipped_not_fatal() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::failing_for(&["ben@x.com"]);

        let report = send_notifications(&directory, &mailer, &dashboards(), &request(Department::Sc))
            .await
            .unwrap();

        assert_eq!(report.sent.len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].sc_email_address, "ben@x.com");
    }

    #[tokio::test]
    async fn test_roster_email_with_extra_header_is_never_sent() {
        let mut records = roster();
        records[1].sc_email_address = "ana@x.com\r\nBcc: leak@evil.com".to_string();
        let directory = StaticDirectory(records);
        let mailer = RecordingMailer::default();

        let report = send_notifications(&directory, &mailer, &dashboards(), &request(Department::Sc))
            .await
            .unwrap();

        assert_eq!(report.sent.len(), 4);
        assert!(report.sent.iter().all(|e| !e.contains(['\r', '\n'])));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].sc_firstname, "Ana");
        assert!(mailer
            .sent()
            .iter()
            .all(|m| m.to.iter().all(|t| !t.contains("leak@evil.com"))));
    }

    #[tokio::test]
    async fn test_unknown_template_falls_back_to_default() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::default();
        let mut req = request(Department::ScTest);
        req.query.name_keys = vec!["reyes".to_string()];

        let report = send_notifications(&directory, &mailer, &dashboards(), &req)
            .await
            .unwrap();

        assert_eq!(report.sent, vec!["ana@x.com"]);
        let body = mailer.body_for("ana@x.com").unwrap();
        assert!(body.starts_with("Hello Ana Reyes,"));
    }

    #[tokio::test]
    async fn test_manager_filter_excludes_own_link_from_roster() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::default();
        let mut req = request(Department::Grm);
        req.query.manager_email = Some("maria@x.com".to_string());

        let report = send_notifications(&directory, &mailer, &dashboards(), &req)
            .await
            .unwrap();

        assert_eq!(report.sent, vec!["maria@x.com"]);
        let body = mailer.body_for("maria@x.com").unwrap();
        assert!(body.starts_with("Hi Maria Santos,"));
        assert!(body.contains("ANA REYES → "));
        assert!(body.contains("JUAN DELA CRUZ → "));
        assert!(!body.contains("MARIA SANTOS → "));
    }

    #[tokio::test]
    async fn test_manager_run_without_filter() {
        let directory = StaticDirectory(roster());
        let mailer = RecordingMailer::default();

        let report = send_notifications(&directory, &mailer, &dashboards(), &request(Department::Grm))
            .await
            .unwrap();

        assert_eq!(report.sent, vec!["maria@x.com", "pedro@x.com"]);
        let pedro = mailer.body_for("pedro@x.com").unwrap();
        assert!(pedro.contains("BEN CRUZ → "));
        assert!(pedro.contains("MARIA SANTOS → "));
        assert!(!pedro.contains("PEDRO PENDUKO → "));
    }

    #[tokio::test]
    async fn test_send_test_email() {
        let mailer = RecordingMailer::default();
        let recipients = vec!["qa1@x.com".to_string(), "qa2@x.com".to_string()];

        let id = send_test_email(&mailer, &recipients).await.unwrap();
        assert_eq!(id, "msg-1");
        assert_eq!(mailer.sent()[0].to, recipients);
        assert_eq!(mailer.sent()[0].subject, "Test");

        let err = send_test_email(&mailer, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
