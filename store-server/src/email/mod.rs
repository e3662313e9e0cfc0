//! Email Delivery
//!
//! Outbound mail for account verification links and login OTP codes.
//! The [`Mailer`] trait hides the transport so handlers can run against
//! a real SMTP relay, a log-only sink, or an in-memory outbox in tests.

pub mod memory;
pub mod smtp;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::OTP_TTL_MINUTES;

pub use memory::{LogMailer, MemoryMailer};
pub use smtp::SmtpMailer;

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        // MailDev defaults: plain connection on localhost:1025
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "no-reply@store.local".to_string(),
            from_name: "Store".to_string(),
        }
    }
}

/// A rendered outbound email.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Email delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Failed to build email message: {0}")]
    BuildFailed(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),
}

/// Outbound mail transport.
///
/// Callers decide how to react to failures; registration keeps succeeding
/// even when the verification mail bounces, it only logs the error.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

// ========== Message builders ==========

/// Account verification email with the clickable confirmation link.
pub fn verification_email(to: &str, base_url: &str, token: &str) -> MailMessage {
    let link = format!(
        "{}/api/auth/verify-email?token={}",
        base_url.trim_end_matches('/'),
        token
    );

    MailMessage {
        to: to.to_string(),
        subject: "Verify your account".to_string(),
        html: format!(
            "<h2>Welcome!</h2>\
             <p>Click the link below to verify your account:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>The link expires in 1 hour. If you did not register, ignore this email.</p>"
        ),
    }
}

/// Login OTP email carrying the 6-digit code.
pub fn otp_email(to: &str, code: &str) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Your login code".to_string(),
        html: format!(
            "<h2>Login verification</h2>\
             <p>Your one-time code is:</p>\
             <h1>{code}</h1>\
             <p>The code expires in {OTP_TTL_MINUTES} minutes. \
             If you did not try to log in, change your password.</p>"
        ),
    }
}
