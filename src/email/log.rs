use async_trait::async_trait;

use super::{Draft, EmailSender, password_changed_draft, password_reset_draft};
use crate::db::entities::{password_reset_token, user};

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

impl LogMailer {
    fn emit(&self, draft: Draft) {
        tracing::info!(
            to = %draft.to,
            subject = draft.subject,
            body = %draft.body,
            "email not sent (log mailer)"
        );
    }
}

#[async_trait]
impl EmailSender for LogMailer {
    async fn send_password_reset(
        &self,
        reset: &password_reset_token::Model,
    ) -> anyhow::Result<()> {
        self.emit(password_reset_draft(reset));
        Ok(())
    }

    async fn send_password_change_email(&self, user: &user::Model) -> anyhow::Result<()> {
        self.emit(password_changed_draft(user));
        Ok(())
    }
}
