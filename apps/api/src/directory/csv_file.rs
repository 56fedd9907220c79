use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use super::{rows_to_records, DirectoryError, DirectorySource};
use crate::models::EmployeeRecord;

/// Reads the roster from a CSV export of the spreadsheet.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    path: PathBuf,
}

impl CsvDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DirectorySource for CsvDirectory {
    async fn fetch_rows(&self) -> Result<Vec<EmployeeRecord>, DirectoryError> {
        info!("Reading roster from {}", self.path.display());
        let bytes = tokio::fs::read(&self.path).await?;
        read_csv(&bytes)
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<EmployeeRecord>, DirectoryError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut values = Vec::new();
    for row in reader.records() {
        values.push(row?.iter().map(str::to_string).collect());
    }
    Ok(rows_to_records(values))
}
