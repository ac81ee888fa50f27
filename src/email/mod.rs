mod log;
mod smtp;

pub use log::LogMailer;
pub use smtp::SmtpMailer;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::EmailConfig,
    db::entities::{password_reset_token, user},
};

/// Outbound account notifications.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_password_reset(
        &self,
        reset: &password_reset_token::Model,
    ) -> anyhow::Result<()>;

    async fn send_password_change_email(&self, user: &user::Model) -> anyhow::Result<()>;
}

/// SMTP when configured, otherwise messages only go to the log.
pub fn build_mailer(cfg: Option<&EmailConfig>) -> anyhow::Result<Arc<dyn EmailSender>> {
    match cfg {
        Some(cfg) => Ok(Arc::new(SmtpMailer::new(cfg)?)),
        None => {
            tracing::warn!("no email config present; outgoing mail will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub(crate) struct Draft {
    pub to: String,
    pub subject: &'static str,
    pub body: String,
}

pub(crate) fn password_reset_draft(reset: &password_reset_token::Model) -> Draft {
    Draft {
        to: reset.user_email.clone(),
        subject: "Password reset",
        body: format!(
            "A password reset was requested for {email}.\n\n\
             Reset token: {token}\n\n\
             The token expires at {expires}. If you did not ask for this, ignore this message.",
            email = reset.user_email,
            token = reset.reset_token,
            expires = reset.expires_at.to_rfc3339(),
        ),
    }
}

pub(crate) fn password_changed_draft(user: &user::Model) -> Draft {
    let greeting = user.name.as_deref().unwrap_or(user.email.as_str());
    Draft {
        to: user.email.clone(),
        subject: "Your password was changed",
        body: format!(
            "Hello {greeting},\n\n\
             The password for your account was just changed. If this was not you, \
             reset your password immediately."
        ),
    }
}
