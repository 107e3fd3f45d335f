//! Outbound mail
//!
//! Handlers hand a [`MailMessage`] to a [`Mailer`]. Production delivers
//! through [`SmtpMailer`]; when no SMTP host is configured [`build_mailer`]
//! falls back to [`LogMailer`], which only records that mail was due.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MailConfig;

/// Kind of message, selects the body template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MailKind {
    EmailVerification,
    PasswordRecovery,
    Invitation,
}

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub kind: MailKind,
    pub subject: String,
    /// Purpose token the recipient needs to complete the flow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl MailMessage {
    /// Plain-text body, with links when the client URL is known
    pub fn body(&self, app_url: Option<&str>) -> String {
        let base = app_url.map(|url| url.trim_end_matches('/'));
        let mut body = match self.kind {
            MailKind::EmailVerification => {
                "Confirm your email address to activate your account.\n".to_string()
            }
            MailKind::PasswordRecovery => {
                "A password reset was requested for your account. \
                 Ignore this message if it was not you.\n"
                    .to_string()
            }
            MailKind::Invitation => format!(
                "{}.\nSign in to accept or decline the invitation.\n",
                self.subject
            ),
        };

        let path = match self.kind {
            MailKind::EmailVerification => "verify-email",
            MailKind::PasswordRecovery => "reset-password",
            MailKind::Invitation => "invitations",
        };
        match (&self.token, base) {
            (Some(token), Some(base)) => {
                body.push_str(&format!("\n{}/{}?token={}\n", base, path, token));
            }
            (Some(token), None) => {
                body.push_str(&format!("\nYour code:\n\n{}\n", token));
            }
            (None, Some(base)) => body.push_str(&format!("\n{}/{}\n", base, path)),
            (None, None) => {}
        }
        body
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}

/// Pick the SMTP mailer when a host is configured, the logging one otherwise
pub fn build_mailer(config: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.host() {
        Some(host) => {
            let mailer = SmtpMailer::new(config)?;
            info!(
                host = %host,
                port = config.smtp_port,
                tls = config.use_tls,
                "SMTP delivery enabled"
            );
            Ok(Arc::new(mailer))
        }
        None => {
            warn!("mail.smtp_host is not set; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

/// Delivers plain-text mail through an SMTP relay
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    app_url: Option<String>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let host = config
            .host()
            .ok_or_else(|| anyhow!("mail.smtp_host is not set"))?;
        let from: Mailbox = config
            .from_address
            .parse()
            .with_context(|| format!("Invalid mail.from_address: {}", config.from_address))?;

        let builder = if !config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        } else if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .with_context(|| format!("Failed to set up TLS for {}", host))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .with_context(|| format!("Failed to set up STARTTLS for {}", host))?
        };
        let mut builder = builder
            .port(config.smtp_port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            app_url: config.app_url.clone(),
        })
    }

    /// Build the wire message without sending it
    pub fn compose(&self, message: &MailMessage) -> anyhow::Result<Message> {
        let to: Mailbox = message
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address: {}", message.to))?;
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body(self.app_url.as_deref()))
            .context("Failed to build mail message")
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        let email = self.compose(&message)?;
        self.transport
            .send(email)
            .await
            .with_context(|| format!("SMTP delivery to {} failed", message.to))?;
        info!(to = %message.to, kind = ?message.kind, "Mail sent");
        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            kind = ?message.kind,
            subject = %message.subject,
            "Outgoing mail not delivered, SMTP is not configured"
        );
        if let Some(ref token) = message.token {
            debug!(to = %message.to, token = %token, "Undelivered mail token");
        }
        Ok(())
    }
}

/// Keeps sent messages in memory so callers can read tokens back
#[derive(Debug, Default, Clone)]
pub struct OutboxMailer {
    outbox: Arc<Mutex<Vec<MailMessage>>>,
}

impl OutboxMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MailMessage> {
        self.outbox.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Most recent token of `kind` sent to `to`
    pub fn last_token(&self, to: &str, kind: MailKind) -> Option<String> {
        self.messages()
            .into_iter()
            .rev()
            .find(|m| m.to == to && m.kind == kind)
            .and_then(|m| m.token)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        self.outbox
            .lock()
            .map_err(|_| anyhow::anyhow!("Mail outbox lock poisoned"))?
            .push(message);
        Ok(())
    }
}
