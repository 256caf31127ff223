//! Reqwest-backed [`Mailer`] posting templated messages to a relay.
//!
//! The relay receives `{"template", "recipient", "payload"}` as JSON and owns
//! rendering and delivery. This adapter only maps transport and status
//! failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;

use crate::domain::ports::{Mailer, MailerError};

const PREVIEW_CHAR_LIMIT: usize = 160;

#[derive(Serialize)]
struct RelayMessage<'a> {
    template: &'a str,
    recipient: &'a str,
    payload: Value,
}

/// Mailer that POSTs to one relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: Client,
    endpoint: Url,
}

impl HttpMailer {
    /// Build a mailer with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, template: &str, recipient: &str, payload: Value) -> Result<(), MailerError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RelayMessage {
                template,
                recipient,
                payload,
            })
            .send()
            .await
            .map_err(|err| MailerError::transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(template, status = status.as_u16(), "mail accepted by relay");
            return Ok(());
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| MailerError::transport(err.to_string()))?;
        Err(map_status_error(status, &body))
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> MailerError {
    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview: String = compact.chars().take(PREVIEW_CHAR_LIMIT).collect();
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    MailerError::rejected(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejection_carries_status_and_compacted_body() {
        let error = map_status_error(StatusCode::UNPROCESSABLE_ENTITY, b"unknown\n   template");
        assert_eq!(error, MailerError::rejected(422_u16, "unknown template"));
    }

    #[rstest]
    fn empty_body_falls_back_to_reason_phrase() {
        let error = map_status_error(StatusCode::SERVICE_UNAVAILABLE, b"");
        assert_eq!(error, MailerError::rejected(503_u16, "Service Unavailable"));
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(PREVIEW_CHAR_LIMIT * 2);
        let MailerError::Rejected { message, .. } =
            map_status_error(StatusCode::BAD_GATEWAY, body.as_bytes())
        else {
            panic!("expected rejection");
        };
        assert_eq!(message.len(), PREVIEW_CHAR_LIMIT);
    }

    #[rstest]
    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        let endpoint = Url::parse("http://127.0.0.1:9/relay").expect("url");
        let mailer = HttpMailer::new(endpoint, Duration::from_millis(200)).expect("client");
        let err = mailer
            .send("password-reset-request", "ada@example.com", Value::Null)
            .await
            .expect_err("nothing listens on the discard port");
        assert!(matches!(err, MailerError::Transport { .. }));
    }
}
