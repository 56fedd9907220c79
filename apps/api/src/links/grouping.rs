use indexmap::IndexMap;

use crate::matching::normalize::normalize;
use crate::models::EmployeeRecord;

/// Records bucketed by a grouping key, in first-seen key order.
pub type GroupedEmployees = IndexMap<String, Vec<EmployeeRecord>>;

/// Stable partition of `records` by `key_fn`.
///
/// Buckets appear in the order their key is first seen and keep source order
/// inside. Records with no key land in the `""` bucket; callers filtering by
/// a concrete key must skip it themselves.
pub fn group_by<F>(records: &[EmployeeRecord], key_fn: F) -> GroupedEmployees
where
    F: Fn(&EmployeeRecord) -> String,
{
    let mut grouped = GroupedEmployees::new();
    for record in records {
        grouped
            .entry(key_fn(record))
            .or_default()
            .push(record.clone());
    }
    grouped
}

/// Groups staff by their manager's email, compared case-insensitively.
pub fn group_by_manager(records: &[EmployeeRecord]) -> GroupedEmployees {
    group_by(records, |r| r.grm_email_address.trim().to_lowercase())
}

/// Groups staff by branch. Branch text is free-form, so spelling variants
/// that differ only in case or spacing share one bucket.
pub fn group_by_branch(records: &[EmployeeRecord]) -> GroupedEmployees {
    group_by(records, |r| normalize(&r.branch).into_string())
}
