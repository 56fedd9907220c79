//! Message rendering for the notification mails.
//!
//! A fixed set of templates (`SC`, `GRM`, `Default`) is filled from a
//! `TemplateContext`. A template asking for a field the context lacks does
//! not fail the send: the `Default` template is rendered instead with
//! whatever is available.

pub mod emails;

use std::sync::LazyLock;

use chrono::Month;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{DashboardLink, Period};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateId {
    #[serde(rename = "SC")]
    Sc,
    #[serde(rename = "GRM")]
    Grm,
    Default,
}

impl TemplateId {
    /// Unknown or absent ids select `Default`.
    pub fn parse(id: Option<&str>) -> Self {
        match id.map(str::trim) {
            Some("SC") => TemplateId::Sc,
            Some("GRM") => TemplateId::Grm,
            _ => TemplateId::Default,
        }
    }

    fn body(&self) -> &'static str {
        match self {
            TemplateId::Sc => emails::SC_TEMPLATE,
            TemplateId::Grm => emails::GRM_TEMPLATE,
            TemplateId::Default => emails::DEFAULT_TEMPLATE,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("template {template:?} needs '{field}' but it was not provided")]
    MissingField { template: TemplateId, field: String },
}

/// Values available to a template. `None` means "not provided".
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub url: Option<String>,
    pub branch: Option<String>,
    /// Pre-formatted "name → link" lines, one per managed report.
    pub managed_links: Option<String>,
}

impl TemplateContext {
    fn value(&self, field: &str) -> Option<String> {
        match field {
            "first_name" => self.first_name.clone(),
            "last_name" => self.last_name.clone(),
            "month" => self.month.map(month_name),
            "year" => self.year.map(|y| y.to_string()),
            "url" => self.url.clone(),
            "branch" => self.branch.clone(),
            "managed_links" => self.managed_links.clone(),
            _ => None,
        }
    }
}

/// Full English month name for 1-12; anything else is echoed back as-is.
pub fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .filter(|m| (1..=12).contains(m))
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| month.to_string())
}

/// Renders `template` strictly: every placeholder must resolve.
pub fn render_strict(template: TemplateId, context: &TemplateContext) -> Result<String, RenderError> {
    let body = template.body();
    for caps in PLACEHOLDER.captures_iter(body) {
        let field = &caps[1];
        if context.value(field).is_none() {
            return Err(RenderError::MissingField {
                template,
                field: field.to_string(),
            });
        }
    }
    Ok(substitute(body, context))
}

/// Renders `template`, falling back to `Default` when a field is missing.
pub fn render(template: TemplateId, context: &TemplateContext) -> String {
    match render_strict(template, context) {
        Ok(text) => text,
        Err(e) => {
            warn!("{e}; falling back to the Default template");
            substitute(TemplateId::Default.body(), context)
        }
    }
}

fn substitute(body: &str, context: &TemplateContext) -> String {
    PLACEHOLDER
        .replace_all(body, |caps: &regex::Captures| {
            context.value(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// One "NAME → url" line per link.
pub fn format_managed_links(links: &[DashboardLink]) -> String {
    links
        .iter()
        .map(|link| format!("{} → {}", link.employee_key, link.url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn subject(period: Period) -> String {
    format!(
        "{} - {} {}",
        emails::SUBJECT_PREFIX,
        month_name(period.month),
        period.year
    )
}
