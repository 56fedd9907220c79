use std::collections::HashSet;

use tracing::{debug, warn};

use crate::models::{Department, EmployeeRecord, RecipientRecord};

/// Recipients built from a roster, plus the rows that could not become one.
#[derive(Debug, Default)]
pub struct RecipientList {
    pub recipients: Vec<RecipientRecord>,
    pub skipped: Vec<EmployeeRecord>,
}

/// Derives one recipient per distinct email for the given audience.
///
/// Emails are compared lower-cased and the first row seen for an address
/// wins; later duplicates are dropped silently. Rows without an address, or
/// whose address contains whitespace or control characters, are returned in
/// `skipped`.
pub fn build_recipients(records: &[EmployeeRecord], audience: Department) -> RecipientList {
    let mut seen = HashSet::new();
    let mut list = RecipientList::default();

    for record in records {
        let (email, first_name, last_name) = match audience {
            Department::Sc | Department::ScTest => (
                record.sc_email_address.trim().to_lowercase(),
                record.sc_firstname.trim().to_string(),
                record.sc_lastname.trim().to_string(),
            ),
            Department::Grm => {
                let (first, last) = split_full_name(&record.grm_name);
                (record.grm_email_address.trim().to_lowercase(), first, last)
            }
        };

        if email.is_empty() {
            list.skipped.push(record.clone());
            continue;
        }
        if !is_plain_address(&email) {
            warn!("Skipping roster row with unusable email {email:?}");
            list.skipped.push(record.clone());
            continue;
        }
        if !seen.insert(email.clone()) {
            debug!("Dropping duplicate recipient row for {email}");
            continue;
        }

        let full_name = format!("{first_name} {last_name}").trim().to_string();
        list.recipients.push(RecipientRecord {
            email,
            first_name,
            last_name,
            full_name,
            audience,
            source: record.clone(),
        });
    }

    list
}

/// An address that can go into a mail header as-is.
fn is_plain_address(email: &str) -> bool {
    !email.chars().any(|c| c.is_whitespace() || c.is_control())
}

/// First token is the first name, the rest is the last name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}
