//! SMTP delivery via lettre's blocking transport.

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use super::{EmailConfig, MailError, MailMessage, Mailer};

/// Sends mail through an SMTP relay.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_transport(config: &EmailConfig) -> Result<SmtpTransport, MailError> {
        if config.smtp_username.is_empty() && config.smtp_password.is_empty() {
            // Local relays (MailDev) take plain connections without credentials
            Ok(SmtpTransport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build())
        } else {
            let credentials = Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            );

            Ok(SmtpTransport::relay(&config.smtp_host)
                .map_err(|e| MailError::Transport(format!("Invalid SMTP relay: {}", e)))?
                .port(config.smtp_port)
                .credentials(credentials)
                .build())
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let MailMessage { to, subject, html } = message;

        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| MailError::BuildFailed(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = to
            .parse()
            .map_err(|e| MailError::BuildFailed(format!("Invalid recipient: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .map_err(|e| MailError::BuildFailed(e.to_string()))?;

        // lettre's SmtpTransport blocks on the socket, keep it off the async workers
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || {
            let transport = Self::build_transport(&config)?;
            transport
                .send(&email)
                .map(|_| ())
                .map_err(|e| MailError::Transport(e.to_string()))
        })
        .await
        .map_err(|e| MailError::Transport(format!("Send task failed: {}", e)))?
    }
}
