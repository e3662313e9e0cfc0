//! Non-delivering mail sinks for development and tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{MailError, MailMessage, Mailer};

/// Logs messages instead of delivering them.
///
/// Used when `EMAIL_ENABLED` is off so local registration and OTP flows
/// still surface their links and codes in the server log.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.html,
            "Email delivery disabled, logging message instead"
        );
        Ok(())
    }
}

/// Captures messages in memory. Test double.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message sent so far, in send order.
    pub fn messages(&self) -> Vec<MailMessage> {
        self.outbox.lock().clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.outbox.lock().push(message);
        Ok(())
    }
}
