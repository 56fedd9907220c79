use std::collections::HashSet;

use tracing::{debug, info};

use crate::links::codec::{self, CodecError};
use crate::links::grouping::GroupedEmployees;
use crate::matching::normalize::normalize;
use crate::models::{DashboardLink, Department, Period};

/// Builds one link per distinct identity across all groups.
///
/// The key of every link is read back out of the generated URL. Identities
/// that encode to the same key keep their first link, which is what happens
/// for manager dashboards where every report row names the same manager.
/// The result is sorted by key so that `limit` is deterministic.
pub fn generate_links(
    base_url: &str,
    grouped: &GroupedEmployees,
    period: Period,
    department: Department,
    lang: &str,
) -> Result<Vec<DashboardLink>, CodecError> {
    info!("Generating {department} dashboard links for {}/{}", period.month, period.year);

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for records in grouped.values() {
        for record in records {
            let identity = department.identity_of(record);
            if identity.is_empty() {
                debug!("Row without a {department} identity left out: {record:?}");
                continue;
            }

            let url = codec::encode(base_url, period, &identity, lang);
            let employee_key = codec::decode(&url)?;

            if seen.insert(employee_key.clone()) {
                links.push(DashboardLink {
                    employee_key,
                    url,
                    branch: record.branch.trim().to_string(),
                });
            }
        }
    }

    links.sort_by(|a, b| a.employee_key.cmp(&b.employee_key));
    info!("Generated {} links", links.len());
    Ok(links)
}

/// Keeps links whose key contains any of the (non-blank) name keys,
/// compared upper-cased. No keys means no filtering.
pub fn filter_by_name_keys(links: Vec<DashboardLink>, name_keys: &[String]) -> Vec<DashboardLink> {
    let keys: Vec<String> = name_keys
        .iter()
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect();
    if keys.is_empty() {
        return links;
    }

    links
        .into_iter()
        .filter(|link| keys.iter().any(|k| link.employee_key.contains(k.as_str())))
        .collect()
}

/// Truncates to the first `limit` links. `None` and `Some(0)` keep everything.
pub fn apply_limit(mut links: Vec<DashboardLink>, limit: Option<usize>) -> Vec<DashboardLink> {
    if let Some(limit) = limit.filter(|l| *l > 0) {
        info!("Limit set to: {limit}");
        links.truncate(limit);
    }
    links
}

/// A manager's roster links, without the manager's own.
pub fn managed_links(links: &[DashboardLink], manager_name: &str) -> Vec<DashboardLink> {
    let own = normalize(manager_name);
    links
        .iter()
        .filter(|link| own.is_empty() || normalize(&link.employee_key) != own)
        .cloned()
        .collect()
}
