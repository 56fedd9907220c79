//! Link and recipient pipeline. Composes directory, grouping, link generation,
//! matching, rendering and dispatch.
//!
//! Flow: fetch roster → (manager scope) → group by manager → generate links →
//!       filter by name keys → limit → { download report cards | build
//!       recipients → match → render → send }.
//!
//! Every run is linear and sequential. Matching consumes the link table and
//! finishes before the first mail goes out.

pub mod handlers;
pub mod notify;
pub mod report_cards;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::directory::DirectorySource;
use crate::errors::AppError;
use crate::links::generator::{apply_limit, filter_by_name_keys, generate_links};
use crate::links::grouping::{group_by_branch, group_by_manager};
use crate::matching::recipients::split_full_name;
use crate::models::{DashboardLink, Department, EmployeeRecord, Period};

/// Bucket name used when listing rows that carry no branch.
pub const UNASSIGNED_BRANCH: &str = "(unassigned)";

/// Dashboard base URLs and the language baked into generated links.
#[derive(Debug, Clone)]
pub struct Dashboards {
    pub sc_url: String,
    pub grm_url: String,
    pub lang: String,
}

impl Dashboards {
    pub fn base_url(&self, department: Department) -> &str {
        match department {
            Department::Sc | Department::ScTest => &self.sc_url,
            Department::Grm => &self.grm_url,
        }
    }
}

/// Which links a run works on.
#[derive(Debug, Clone)]
pub struct LinkQuery {
    pub department: Department,
    pub period: Period,
    pub name_keys: Vec<String>,
    pub manager_email: Option<String>,
    pub limit: Option<usize>,
}

/// The rows reporting to one manager, plus a synthesized row for the
/// manager so that the manager's own link is generated too.
#[derive(Debug, Clone)]
pub struct ManagerScope {
    pub reports: Vec<EmployeeRecord>,
    pub manager: EmployeeRecord,
}

impl ManagerScope {
    /// Reports followed by the manager's pseudo-row.
    pub fn with_manager(&self) -> Vec<EmployeeRecord> {
        let mut records = self.reports.clone();
        records.push(self.manager.clone());
        records
    }
}

/// Reads the roster; an empty roster is a `NotFound`.
pub async fn fetch_roster(directory: &dyn DirectorySource) -> Result<Vec<EmployeeRecord>, AppError> {
    let records = directory.fetch_rows().await?;
    if records.is_empty() {
        return Err(AppError::NotFound(
            "The employee directory returned no rows".to_string(),
        ));
    }
    info!("Fetched {} roster rows", records.len());
    Ok(records)
}

/// Keeps the rows whose manager email matches (case-insensitively) and
/// synthesizes the manager's own row from the first match.
pub fn scope_to_manager(records: Vec<EmployeeRecord>, manager_email: &str) -> Result<ManagerScope, AppError> {
    let wanted = manager_email.trim().to_lowercase();
    if wanted.is_empty() {
        return Err(AppError::Validation("grm_email cannot be empty".to_string()));
    }

    let reports: Vec<EmployeeRecord> = records
        .into_iter()
        .filter(|r| r.grm_email_address.trim().to_lowercase() == wanted)
        .collect();
    let Some(first) = reports.first() else {
        return Err(AppError::NotFound(format!(
            "No employees found for: {manager_email}"
        )));
    };

    let manager_name = first.grm_name.trim().to_uppercase();
    info!("Manager full name: {manager_name}");
    let (first_name, last_name) = split_full_name(&manager_name);
    let manager = EmployeeRecord {
        sc_firstname: first_name,
        sc_lastname: last_name,
        grm_name: manager_name,
        grm_email_address: wanted,
        branch: first.branch.clone(),
        ..Default::default()
    };

    Ok(ManagerScope { reports, manager })
}

/// Generates the de-duplicated, key-sorted links for `records`.
pub fn links_for(
    records: &[EmployeeRecord],
    dashboards: &Dashboards,
    department: Department,
    period: Period,
) -> Result<Vec<DashboardLink>, AppError> {
    let grouped = group_by_manager(records);
    let links = generate_links(
        dashboards.base_url(department),
        &grouped,
        period,
        department,
        &dashboards.lang,
    )?;
    Ok(links)
}

/// Applies the name-key filter and then the limit.
pub fn narrow(links: Vec<DashboardLink>, query: &LinkQuery) -> Vec<DashboardLink> {
    let links = filter_by_name_keys(links, &query.name_keys);
    apply_limit(links, query.limit)
}

/// The full link stage of the pipeline, as used by report downloads and
/// link lookups.
pub async fn generate_employee_links(
    directory: &dyn DirectorySource,
    dashboards: &Dashboards,
    query: &LinkQuery,
) -> Result<Vec<DashboardLink>, AppError> {
    let records = fetch_roster(directory).await?;
    let records = match query.manager_email.as_deref() {
        Some(email) => scope_to_manager(records, email)?.with_manager(),
        None => records,
    };

    let links = links_for(&records, dashboards, query.department, query.period)?;
    Ok(narrow(links, query))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeUrl {
    pub first_name: String,
    pub last_name: String,
    pub url: String,
    pub branch: String,
}

/// First link surviving the query, split back into first/last name.
pub async fn lookup_employee_url(
    directory: &dyn DirectorySource,
    dashboards: &Dashboards,
    query: &LinkQuery,
) -> Result<EmployeeUrl, AppError> {
    let links = generate_employee_links(directory, dashboards, query).await?;
    let link = links
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound("No employee link matched the request".to_string()))?;

    let mut tokens = link.employee_key.split_whitespace();
    let first_name = tokens.next().unwrap_or_default().to_string();
    let last_name = tokens.last().unwrap_or(first_name.as_str()).to_string();

    Ok(EmployeeUrl {
        first_name,
        last_name,
        url: link.url,
        branch: link.branch,
    })
}

/// Links bucketed by branch, branches in first-seen order.
///
/// Branch spellings that differ only in case or spacing share a bucket,
/// labelled with the first spelling seen. Rows without a branch are listed
/// under `UNASSIGNED_BRANCH`.
pub async fn links_by_branch(
    directory: &dyn DirectorySource,
    dashboards: &Dashboards,
    department: Department,
    period: Period,
) -> Result<IndexMap<String, Vec<DashboardLink>>, AppError> {
    let records = fetch_roster(directory).await?;
    let mut by_branch = IndexMap::new();

    for (key, group) in group_by_branch(&records) {
        let label = if key.is_empty() {
            UNASSIGNED_BRANCH.to_string()
        } else {
            group[0].branch.trim().to_string()
        };
        let links = links_for(&group, dashboards, department, period)?;
        by_branch.insert(label, links);
    }

    Ok(by_branch)
}
