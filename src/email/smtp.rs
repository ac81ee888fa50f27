use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{Draft, EmailSender, password_changed_draft, password_reset_draft};
use crate::{
    config::EmailConfig,
    db::entities::{password_reset_token, user},
};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &EmailConfig) -> anyhow::Result<Self> {
        let from = cfg
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender address: {}", cfg.from))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .with_context(|| format!("failed to configure SMTP relay {}", cfg.host))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), cfg.password.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { transport, from })
    }

    async fn deliver(&self, draft: Draft) -> anyhow::Result<()> {
        let to = draft
            .to
            .parse::<Mailbox>()
            .with_context(|| format!("invalid recipient address: {}", draft.to))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(draft.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(draft.body)
            .context("failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("SMTP delivery failed")?;
        tracing::info!(to = %draft.to, subject = draft.subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send_password_reset(
        &self,
        reset: &password_reset_token::Model,
    ) -> anyhow::Result<()> {
        self.deliver(password_reset_draft(reset)).await
    }

    async fn send_password_change_email(&self, user: &user::Model) -> anyhow::Result<()> {
        self.deliver(password_changed_draft(user)).await
    }
}
