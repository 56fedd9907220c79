//! Mail dispatch. All outgoing mail goes through a `MailTransport`; the
//! production transport is the Gmail API.

pub mod gmail;

use async_trait::async_trait;
use thiserror::Error;

pub use gmail::GmailClient;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gmail API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no recipients given")]
    NoRecipients,

    #[error("line break in {0} header")]
    HeaderInjection(&'static str),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends one plain-text message to every address in `to`.
    /// Returns the transport's message id.
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<String, MailError>;
}
