use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{rows_to_records, DirectoryError, DirectorySource};
use crate::models::EmployeeRecord;

const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SheetsError {
    error: SheetsErrorBody,
}

#[derive(Debug, Deserialize)]
struct SheetsErrorBody {
    message: String,
}

/// Reads the roster range from Google Sheets with a pre-issued bearer token.
#[derive(Clone)]
pub struct SheetsDirectory {
    client: Client,
    spreadsheet_id: String,
    range: String,
    access_token: String,
}

impl SheetsDirectory {
    pub fn new(spreadsheet_id: String, range: String, access_token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            spreadsheet_id,
            range,
            access_token,
        }
    }

    fn values_url(&self) -> String {
        format!(
            "{SHEETS_API_URL}/{}/values/{}",
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(&self.range)
        )
    }
}

#[async_trait]
impl DirectorySource for SheetsDirectory {
    async fn fetch_rows(&self) -> Result<Vec<EmployeeRecord>, DirectoryError> {
        info!("Fetching roster from spreadsheet range {}", self.range);

        let response = self
            .client
            .get(self.values_url())
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<SheetsError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(DirectoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let records = parse_value_range(&body)?;
        debug!("Spreadsheet returned {} roster rows", records.len());
        Ok(records)
    }
}

fn parse_value_range(body: &str) -> Result<Vec<EmployeeRecord>, DirectoryError> {
    let range: ValueRange = serde_json::from_str(body)?;
    Ok(rows_to_records(range.values))
}
