use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One roster row as read from the directory spreadsheet.
///
/// Every known column is a plain string; cells missing from a short row are
/// left empty. Columns the roster grows later land in `extra` in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub sc_firstname: String,
    pub sc_lastname: String,
    pub sc_email_address: String,
    pub grm_name: String,
    pub grm_email_address: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extra: IndexMap<String, String>,
}

impl EmployeeRecord {
    /// Assigns a cell by its header name. Unknown headers go to `extra`.
    pub fn set_field(&mut self, header: &str, value: String) {
        match header {
            "sc_firstname" => self.sc_firstname = value,
            "sc_lastname" => self.sc_lastname = value,
            "sc_email_address" => self.sc_email_address = value,
            "grm_name" => self.grm_name = value,
            "grm_email_address" => self.grm_email_address = value,
            "branch" => self.branch = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }

    /// `"{first} {last}"` of the staff member, trimmed.
    pub fn sc_full_name(&self) -> String {
        format!("{} {}", self.sc_firstname.trim(), self.sc_lastname.trim())
            .trim()
            .to_string()
    }

    pub fn is_blank(&self) -> bool {
        self.sc_firstname.trim().is_empty()
            && self.sc_lastname.trim().is_empty()
            && self.sc_email_address.trim().is_empty()
            && self.grm_name.trim().is_empty()
            && self.grm_email_address.trim().is_empty()
            && self.branch.trim().is_empty()
            && self.extra.values().all(|v| v.trim().is_empty())
    }
}

/// Department tag carried through links, report pages and templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    #[serde(rename = "SC")]
    Sc,
    /// Staff dashboard, exported from the `SC_TEST` report page.
    #[serde(rename = "SC_TEST")]
    ScTest,
    #[serde(rename = "GRM")]
    Grm,
}

impl Department {
    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Sc => "SC",
            Department::ScTest => "SC_TEST",
            Department::Grm => "GRM",
        }
    }

    /// Parses `SC`, `SC_TEST` or `GRM`, ignoring case and surrounding space.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "SC" => Some(Department::Sc),
            "SC_TEST" => Some(Department::ScTest),
            "GRM" => Some(Department::Grm),
            _ => None,
        }
    }

    /// True when the department's dashboard is keyed by the manager's name.
    pub fn is_manager(&self) -> bool {
        matches!(self, Department::Grm)
    }

    /// The identity a dashboard link encodes for this row.
    pub fn identity_of(&self, record: &EmployeeRecord) -> String {
        match self {
            Department::Sc | Department::ScTest => record.sc_full_name(),
            Department::Grm => record.grm_name.trim().to_string(),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reporting period baked into every link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    /// 1-12
    pub month: u32,
}

/// A generated dashboard deep link.
///
/// `employee_key` is the identity recovered by decoding `url`, not the raw
/// spreadsheet text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLink {
    pub employee_key: String,
    pub url: String,
    pub branch: String,
}

/// A mail recipient derived from a roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientRecord {
    /// Lower-cased, unique within one run.
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub audience: Department,
    pub source: EmployeeRecord,
}
