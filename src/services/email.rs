//! Email service for account notifications
//!
//! Delivery is best-effort: messages are sent from a detached task with a bounded
//! timeout and failures are only logged.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::task::JoinHandle;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    views::emails,
};

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Message templates and the fields each one needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome { name: String, username: String },
    ResetLink { username: String, reset_url: String },
    PasswordResetConfirmation { username: String },
    DeleteConfirmation { username: String, user_id: i64 },
}

impl EmailTemplate {
    pub fn name(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome { .. } => "welcome_mail",
            EmailTemplate::ResetLink { .. } => "reset_link_email",
            EmailTemplate::PasswordResetConfirmation { .. } => "password_reset_confirmation",
            EmailTemplate::DeleteConfirmation { .. } => "delete_confirmation",
        }
    }

    pub fn render(&self) -> String {
        let markup = match self {
            EmailTemplate::Welcome { name, username } => emails::welcome(name, username),
            EmailTemplate::ResetLink { username, reset_url } => emails::reset_link(username, reset_url),
            EmailTemplate::PasswordResetConfirmation { username } => {
                emails::password_reset_confirmation(username)
            }
            EmailTemplate::DeleteConfirmation { username, user_id } => {
                emails::delete_confirmation(username, *user_id)
            }
        };
        markup.into_string()
    }
}

/// Something that can put a message on the wire
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()>;
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, email: &OutgoingEmail) -> AppResult<Message> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("BiblioTech");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(&email.to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(format!("{}\n\nView this message in an HTML capable client.", email.subject)),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))
    }

    fn build_transport(&self) -> AppResult<SmtpTransport> {
        let mailer_builder = if self.config.smtp_use_tls {
            // Use STARTTLS for secure connection
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port)
        .timeout(Some(Duration::from_secs(self.config.timeout_seconds)));

        let mailer_builder = if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            mailer_builder.credentials(Credentials::new(username.clone(), password.clone()))
        } else {
            mailer_builder
        };

        Ok(mailer_builder.build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        let message = self.build_message(&email)?;
        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || mailer.send(&message))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

/// Logs messages instead of sending them; used when SMTP is disabled
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn deliver(&self, email: OutgoingEmail) -> AppResult<()> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email delivery disabled, message dropped");
        Ok(())
    }
}

#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl EmailService {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Transport chosen from configuration
    pub fn from_config(config: &EmailConfig) -> Self {
        let transport: Arc<dyn MailTransport> = if config.enabled {
            Arc::new(SmtpMailer::new(config.clone()))
        } else {
            Arc::new(LogMailer)
        };
        Self::new(transport, Duration::from_secs(config.timeout_seconds))
    }

    /// Render and dispatch a message without waiting for it.
    ///
    /// The returned handle resolves to whether delivery succeeded; callers may drop it.
    pub fn send(&self, subject: &str, recipient: &str, template: EmailTemplate) -> JoinHandle<bool> {
        let email = OutgoingEmail {
            to: recipient.to_string(),
            subject: subject.to_string(),
            html: template.render(),
        };
        let transport = self.transport.clone();
        let timeout = self.timeout;
        let template_name = template.name();

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, transport.deliver(email)).await {
                Ok(Ok(())) => {
                    tracing::debug!("Email '{}' delivered", template_name);
                    true
                }
                Ok(Err(e)) => {
                    tracing::warn!("Email '{}' failed: {}", template_name, e);
                    false
                }
                Err(_) => {
                    tracing::warn!("Email '{}' timed out after {:?}", template_name, timeout);
                    false
                }
            }
        })
    }
}
