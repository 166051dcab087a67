// src/mail.rs
//! Contact-form mail dispatch over an SMTP relay. One attempt per message.

use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use metrics::counter;
use std::sync::Arc;

use crate::config::AppConfig;

/// A validated contact submission. Only exists for the duration of a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingFields;

impl ContactMessage {
    /// All three fields must be present and not blank.
    pub fn from_parts(
        name: Option<&str>,
        email: Option<&str>,
        body: Option<&str>,
    ) -> Result<Self, MissingFields> {
        let field = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or(MissingFields)
        };
        Ok(Self {
            name: field(name)?,
            email: field(email)?,
            body: field(body)?,
        })
    }

    pub fn subject(&self) -> String {
        format!("New Contact Message from {}", self.name)
    }

    pub fn text_body(&self) -> String {
        format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            self.name, self.email, self.body
        )
    }
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, msg: &ContactMessage) -> Result<()>;
}

pub type DynMailer = Arc<dyn Mailer>;

/// Used when SMTP credentials are not configured; every send fails.
pub struct DisabledMailer;

#[async_trait::async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, _msg: &ContactMessage) -> Result<()> {
        Err(anyhow!("mail relay not configured (MAIL_USERNAME / MAIL_PASSWORD)"))
    }
}

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// `Ok(None)` when credentials or a recipient are missing.
    pub fn from_config(cfg: &AppConfig) -> Result<Option<Self>> {
        let (Some(user), Some(pass)) = (
            cfg.secrets.mail_username.clone(),
            cfg.secrets.mail_password.clone(),
        ) else {
            return Ok(None);
        };
        let Some(recipient) = cfg.mail_recipient() else {
            return Ok(None);
        };

        let from: Mailbox = user
            .parse()
            .with_context(|| format!("invalid MAIL_USERNAME address: {user}"))?;
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("invalid mail recipient: {recipient}"))?;

        let builder = if cfg.mail.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.mail.server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.mail.server)
        }
        .with_context(|| format!("invalid MAIL_SERVER: {}", cfg.mail.server))?;

        let mailer = builder
            .port(cfg.mail.port)
            .credentials(Credentials::new(user, pass))
            .timeout(Some(cfg.upstream.timeout()))
            .build();

        Ok(Some(Self { mailer, from, to }))
    }
}

/// Plain-text email from the relay user to the desk. The visitor goes into
/// Reply-To when their address parses; the relay only sends as its own user.
pub fn compose(from: &Mailbox, to: &Mailbox, msg: &ContactMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(msg.subject())
        .header(header::ContentType::TEXT_PLAIN);
    if let Ok(reply_to) = msg.email.parse::<Mailbox>() {
        builder = builder.reply_to(reply_to);
    }
    builder.body(msg.text_body()).context("build email")
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, msg: &ContactMessage) -> Result<()> {
        let email = compose(&self.from, &self.to, msg)?;
        self.mailer.send(email).await.context("send email")?;
        Ok(())
    }
}

/// SMTP mailer when configured, otherwise the disabled stub.
pub fn build_mailer(cfg: &AppConfig) -> DynMailer {
    match SmtpMailer::from_config(cfg) {
        Ok(Some(m)) => Arc::new(m),
        Ok(None) => {
            tracing::info!(target: "mail", "SMTP not configured; contact form will report failures");
            Arc::new(DisabledMailer)
        }
        Err(e) => {
            tracing::warn!(target: "mail", error = %format!("{e:#}"), "SMTP config invalid; contact form disabled");
            Arc::new(DisabledMailer)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    MissingFields,
    Failed,
}

/// Validate, then make exactly one send attempt.
pub async fn send_contact(
    mailer: &dyn Mailer,
    name: Option<&str>,
    email: Option<&str>,
    body: Option<&str>,
) -> SendOutcome {
    let msg = match ContactMessage::from_parts(name, email, body) {
        Ok(m) => m,
        Err(MissingFields) => {
            counter!("contact_messages_total", "outcome" => "missing_fields").increment(1);
            return SendOutcome::MissingFields;
        }
    };
    match mailer.send(&msg).await {
        Ok(()) => {
            tracing::info!(target: "mail", "contact message sent");
            counter!("contact_messages_total", "outcome" => "sent").increment(1);
            SendOutcome::Sent
        }
        Err(e) => {
            tracing::error!(target: "mail", error = %format!("{e:#}"), "error sending email");
            counter!("contact_messages_total", "outcome" => "failed").increment(1);
            SendOutcome::Failed
        }
    }
}
