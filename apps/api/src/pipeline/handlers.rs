//! Axum route handlers for report-card generation and notification mail.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::parse_list;
use crate::errors::AppError;
use crate::models::{DashboardLink, Department, Period};
use crate::pipeline::notify::{send_notifications, send_test_email, DispatchReport, NotifyRequest};
use crate::pipeline::report_cards::run_report_cards;
use crate::pipeline::{links_by_branch, lookup_employee_url, EmployeeUrl, LinkQuery};
use crate::report::ReportCardSummary;
use crate::routes::Success;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportCardParams {
    pub dept: Department,
    pub year: i32,
    pub month: u32,
    pub limit: Option<usize>,
    /// Comma-separated name fragments.
    pub employee_keys: Option<String>,
    pub grm_email: Option<String>,
    pub headless: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EmployeeUrlParams {
    pub year: i32,
    pub month: u32,
    /// Comma-separated name fragments.
    pub emp_key: Option<String>,
    pub grm_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BranchParams {
    pub dept: Department,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub dept: Department,
    pub year: i32,
    pub month: u32,
    pub limit: Option<usize>,
    #[serde(default)]
    pub employee_keys: Vec<String>,
    pub grm_email: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TestEmailResponse {
    pub message_id: String,
    pub recipients: Vec<String>,
}

fn validate_period(year: i32, month: u32) -> Result<Period, AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }
    if year <= 0 {
        return Err(AppError::Validation(format!("year must be positive, got {year}")));
    }
    Ok(Period { year, month })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| AppError::Validation(e.body_text()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /generate/get-report-card
///
/// Downloads the report card of every employee the query selects.
pub async fn handle_get_report_card(
    State(state): State<AppState>,
    params: Result<Query<ReportCardParams>, QueryRejection>,
) -> Result<Success<ReportCardSummary>, AppError> {
    let params = query_params(params)?;
    let query = LinkQuery {
        department: params.dept,
        period: validate_period(params.year, params.month)?,
        name_keys: parse_list(params.employee_keys.as_deref().unwrap_or_default()),
        manager_email: non_blank(params.grm_email),
        limit: params.limit,
    };

    let summary = run_report_cards(
        state.directory.as_ref(),
        state.downloader.as_ref(),
        &state.dashboards(),
        &query,
        params.headless.unwrap_or(true),
    )
    .await?;

    Ok(Success(summary))
}

/// GET /generate/get-sc
///
/// Staff-dashboard report cards only; no manager filter.
pub async fn handle_get_sc(
    State(state): State<AppState>,
    params: Result<Query<ReportCardParams>, QueryRejection>,
) -> Result<Success<ReportCardSummary>, AppError> {
    let params = query_params(params)?;
    if params.dept.is_manager() {
        return Err(AppError::Validation(
            "get-sc only serves SC dashboards; use get-report-card for GRM".to_string(),
        ));
    }
    let query = LinkQuery {
        department: params.dept,
        period: validate_period(params.year, params.month)?,
        name_keys: parse_list(params.employee_keys.as_deref().unwrap_or_default()),
        manager_email: None,
        limit: params.limit,
    };

    let summary = run_report_cards(
        state.directory.as_ref(),
        state.downloader.as_ref(),
        &state.dashboards(),
        &query,
        params.headless.unwrap_or(true),
    )
    .await?;

    Ok(Success(summary))
}

/// GET /generate/get-employee-url
///
/// Returns the first matching dashboard link. A `grm_email` switches to the
/// manager dashboard of that manager.
pub async fn handle_get_employee_url(
    State(state): State<AppState>,
    params: Result<Query<EmployeeUrlParams>, QueryRejection>,
) -> Result<Success<EmployeeUrl>, AppError> {
    let params = query_params(params)?;
    let manager_email = non_blank(params.grm_email);
    let query = LinkQuery {
        department: if manager_email.is_some() {
            Department::Grm
        } else {
            Department::Sc
        },
        period: validate_period(params.year, params.month)?,
        name_keys: parse_list(params.emp_key.as_deref().unwrap_or_default()),
        manager_email,
        limit: None,
    };

    let found = lookup_employee_url(state.directory.as_ref(), &state.dashboards(), &query).await?;
    Ok(Success(found))
}

/// GET /generate/links-by-branch
pub async fn handle_links_by_branch(
    State(state): State<AppState>,
    params: Result<Query<BranchParams>, QueryRejection>,
) -> Result<Success<IndexMap<String, Vec<DashboardLink>>>, AppError> {
    let params = query_params(params)?;
    let period = validate_period(params.year, params.month)?;

    let grouped = links_by_branch(
        state.directory.as_ref(),
        &state.dashboards(),
        params.dept,
        period,
    )
    .await?;

    Ok(Success(grouped))
}

/// POST /send/send-email
///
/// Full notification run: links → recipients → match → render → send.
pub async fn handle_send_email(
    State(state): State<AppState>,
    body: Result<Json<SendEmailRequest>, JsonRejection>,
) -> Result<Success<DispatchReport>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let request = NotifyRequest {
        query: LinkQuery {
            department: body.dept,
            period: validate_period(body.year, body.month)?,
            name_keys: body.employee_keys,
            manager_email: non_blank(body.grm_email),
            limit: body.limit,
        },
        template: body.template,
    };

    let report = send_notifications(
        state.directory.as_ref(),
        state.mailer.as_ref(),
        &state.dashboards(),
        &request,
    )
    .await?;

    Ok(Success(report))
}

/// POST /send/test-email
pub async fn handle_test_email(
    State(state): State<AppState>,
) -> Result<Success<TestEmailResponse>, AppError> {
    let recipients = state.config.test_emails.clone();
    let message_id = send_test_email(state.mailer.as_ref(), &recipients).await?;
    Ok(Success(TestEmailResponse {
        message_id,
        recipients,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_period() {
        assert_eq!(
            validate_period(2025, 9).unwrap(),
            Period {
                year: 2025,
                month: 9
            }
        );
        assert!(matches!(validate_period(2025, 0), Err(AppError::Validation(_))));
        assert!(matches!(validate_period(2025, 13), Err(AppError::Validation(_))));
        assert!(matches!(validate_period(0, 5), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some(" ".to_string())), None);
        assert_eq!(non_blank(Some("a@x.com".to_string())), Some("a@x.com".to_string()));
        assert_eq!(non_blank(None), None);
    }
}
