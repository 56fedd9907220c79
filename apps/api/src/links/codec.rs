//! Dashboard deep-link codec.
//!
//! A link carries one opaque query parameter, `params`, holding a
//! percent-encoded JSON object with the reporting period and the upper-cased
//! employee name:
//!
//! ```text
//! {base_url}?hl=en&params=%7B%22ds0.sc_employee_year%22%3A2025%2C...%7D
//! ```
//!
//! Law: `decode(&encode(base, period, name, lang))? == name.to_uppercase()`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::models::Period;

const PARAMS_KEY: &str = "params";

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("malformed link: not a valid URL ({0})")]
    InvalidUrl(String),

    #[error("malformed link: 'params' query parameter is missing")]
    MissingParams,

    #[error("malformed link: 'params' is not valid JSON ({0})")]
    InvalidJson(String),
}

/// Field order matches what the dashboard expects to see.
#[derive(Debug, Serialize, Deserialize)]
struct DashboardParams {
    #[serde(rename = "ds0.sc_employee_year")]
    year: i32,
    #[serde(rename = "ds0.sc_employee_month")]
    month: u32,
    #[serde(rename = "ds0.sc_employee_name")]
    name: String,
}

/// Builds the deep link for one employee. Pure function of its inputs.
pub fn encode(base_url: &str, period: Period, employee_name: &str, lang: &str) -> String {
    let params = DashboardParams {
        year: period.year,
        month: period.month,
        name: employee_name.to_uppercase(),
    };
    // Serializing a struct of plain scalars cannot fail.
    let json = serde_json::to_string(&params).unwrap_or_default();

    format!(
        "{base_url}?hl={}&{PARAMS_KEY}={}",
        urlencoding::encode(lang),
        urlencoding::encode(&json)
    )
}

/// Recovers the employee name a link encodes.
pub fn decode(link: &str) -> Result<String, CodecError> {
    let parsed = Url::parse(link).map_err(|e| CodecError::InvalidUrl(e.to_string()))?;

    let raw = parsed
        .query_pairs()
        .find(|(key, _)| key == PARAMS_KEY)
        .map(|(_, value)| value.into_owned())
        .ok_or(CodecError::MissingParams)?;

    let params: DashboardParams =
        serde_json::from_str(&raw).map_err(|e| CodecError::InvalidJson(e.to_string()))?;

    Ok(params.name)
}
