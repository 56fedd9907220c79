use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{MailError, MailTransport};

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Debug, Serialize)]
struct SendRequest {
    raw: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GmailError {
    error: GmailErrorBody,
}

#[derive(Debug, Deserialize)]
struct GmailErrorBody {
    message: String,
}

/// Sends mail as `sender` through the Gmail `messages.send` endpoint.
#[derive(Clone)]
pub struct GmailClient {
    client: Client,
    sender: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(sender: String, access_token: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            sender,
            access_token,
        }
    }
}

#[async_trait]
impl MailTransport for GmailClient {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<String, MailError> {
        if to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        check_headers(&self.sender, to, subject)?;

        let message = build_message(&self.sender, to, subject, body);
        let request = SendRequest {
            raw: URL_SAFE.encode(message.as_bytes()),
        };

        let response = self
            .client
            .post(GMAIL_SEND_URL)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GmailError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: SendResponse = response.json().await?;
        info!("Email sent to {}! Message ID: {}", to.join(", "), sent.id);
        Ok(sent.id)
    }
}

/// Header values end up verbatim in the message; a CR or LF in any of them
/// would start a new header.
fn check_headers(sender: &str, to: &[String], subject: &str) -> Result<(), MailError> {
    let has_break = |value: &str| value.contains(['\r', '\n']);
    if to.iter().any(|address| has_break(address.as_str())) {
        return Err(MailError::HeaderInjection("To"));
    }
    if has_break(sender) {
        return Err(MailError::HeaderInjection("From"));
    }
    if has_break(subject) {
        return Err(MailError::HeaderInjection("Subject"));
    }
    Ok(())
}

/// Plain-text RFC 5322 message.
fn build_message(sender: &str, to: &[String], subject: &str, body: &str) -> String {
    format!(
        "To: {}\r\nFrom: {sender}\r\nSubject: {}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{body}",
        to.join(", "),
        encode_header(subject),
    )
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!(
            "=?UTF-8?B?{}?=",
            base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
        )
    }
}
