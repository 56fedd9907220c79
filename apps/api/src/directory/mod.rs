//! Directory source for the employee/manager roster.
//!
//! The roster is tabular: the first row names the columns and each later row
//! is one `EmployeeRecord`. Two sources exist, chosen at startup:
//! `SheetsDirectory` (Google Sheets `values.get`) and `CsvDirectory` (a local
//! CSV export of the same sheet).

pub mod csv_file;
pub mod sheets;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::EmployeeRecord;

pub use csv_file::CsvDirectory;
pub use sheets::SheetsDirectory;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Every roster row, in source order.
    async fn fetch_rows(&self) -> Result<Vec<EmployeeRecord>, DirectoryError>;
}

/// Zips each data row with the header row.
///
/// Short rows leave the remaining fields empty, cells past the header are
/// ignored and fully blank rows are dropped.
pub fn rows_to_records(values: Vec<Vec<String>>) -> Vec<EmployeeRecord> {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    let header: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    rows.filter_map(|row| {
        let mut record = EmployeeRecord::default();
        for (column, cell) in header.iter().zip(row) {
            record.set_field(column, cell);
        }
        (!record.is_blank()).then_some(record)
    })
    .collect()
}
