//! Driven port for templated email delivery.

use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;

define_port_error! {
    /// Delivery failures reported by mail adapters.
    pub enum MailerError {
        /// The relay could not be reached.
        Transport { message: String } => "mail relay unreachable: {message}",
        /// The relay refused the message.
        Rejected { status: u16, message: String } => "mail relay rejected message ({status}): {message}",
    }
}

/// Sends a named template to one recipient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Render `template` with `payload` and deliver it to `recipient`.
    async fn send(&self, template: &str, recipient: &str, payload: Value) -> Result<(), MailerError>;
}

/// Mailer that accepts and discards everything.
///
/// Wired when no relay is configured so flows that send mail still complete.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardingMailer;

#[async_trait]
impl Mailer for DiscardingMailer {
    async fn send(&self, template: &str, recipient: &str, _payload: Value) -> Result<(), MailerError> {
        tracing::debug!(template, recipient, "mail relay not configured; message discarded");
        Ok(())
    }
}
