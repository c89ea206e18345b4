//! Transactional email.
//!
//! [`Mailer`] is the fire-and-forget `send(recipient, template, data)`
//! capability handlers use for invitations. [`SmtpMailer`] delivers through
//! the `lettre` async SMTP transport; [`LogMailer`] only logs and is used when
//! `SMTP_HOST` is not configured.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// The emails the portal sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// New or re-sent client invitation. Data: `name`, `email`,
    /// `temporary_password`.
    Invitation,
}

impl MailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            MailTemplate::Invitation => "invitation",
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            MailTemplate::Invitation => "You have been invited to the client portal",
        }
    }

    /// Plain-text body. Missing data fields render as empty strings.
    pub fn render(&self, data: &Value) -> String {
        let field = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or_default();
        match self {
            MailTemplate::Invitation => format!(
                "Hello {name},\n\n\
                 An account has been created for you on the client portal.\n\n\
                 Email: {email}\n\
                 Temporary password: {password}\n\n\
                 Please sign in and change your password.",
                name = field("name"),
                email = field("email"),
                password = field("temporary_password"),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, template: MailTemplate, data: &Value) -> Result<(), EmailError>;
}

/// Send on a background task. Failures are logged and never reach the caller.
pub fn send_detached(mailer: Arc<dyn Mailer>, to: String, template: MailTemplate, data: Value) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, template, &data).await {
            tracing::error!(error = %e, to = %to, template = template.name(), "Failed to send email");
        }
    });
}

/// Mailer that only records the send in the log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, template: MailTemplate, _data: &Value) -> Result<(), EmailError> {
        tracing::info!(to, template = template.name(), "Email delivery not configured, skipping send");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@portal.local";

/// Configuration for the SMTP mailer.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                |
    /// |-----------------|----------|------------------------|
    /// | `SMTP_HOST`     | yes      |                        |
    /// | `SMTP_PORT`     | no       | `587`                  |
    /// | `SMTP_FROM`     | no       | `noreply@portal.local` |
    /// | `SMTP_USER`     | no       |                        |
    /// | `SMTP_PASSWORD` | no       |                        |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// SmtpMailer
// ---------------------------------------------------------------------------

pub struct SmtpMailer {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            config,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, template: MailTemplate, data: &Value) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to.parse()?)
            .subject(template.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(template.render(data))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport.send(email).await?;

        tracing::info!(to, template = template.name(), "Email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_env_returns_none_without_smtp_host() {
        std::env::remove_var("SMTP_HOST");
        assert!(EmailConfig::from_env().is_none());
    }

    #[test]
    fn email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }

    #[test]
    fn invitation_body_includes_credentials() {
        let body = MailTemplate::Invitation.render(&json!({
            "name": "Grace",
            "email": "grace@example.com",
            "temporary_password": "Ab3dEf6hIj9k",
        }));
        assert!(body.starts_with("Hello Grace,"));
        assert!(body.contains("Email: grace@example.com"));
        assert!(body.contains("Temporary password: Ab3dEf6hIj9k"));
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let result = LogMailer.send("x@example.com", MailTemplate::Invitation, &json!({})).await;
        assert!(result.is_ok());
    }
}
