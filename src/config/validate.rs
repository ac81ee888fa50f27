use anyhow::{Result, bail};

use super::AppConfig;

const MIN_ADMIN_PASSWORD_LEN: usize = 8;

pub fn validate(cfg: &AppConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if cfg.general.host.trim().is_empty() {
        errors.push("general.host must not be empty".to_string());
    }

    if let Some(database) = cfg.database.as_ref() {
        if database.url.trim().is_empty() {
            errors.push("database.url must not be empty".to_string());
        }

        if database
            .test_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            errors.push("database.test_url must not be empty when set".to_string());
        }

        if database.min_idle > database.max_connections {
            errors.push(format!(
                "database.min_idle ({}) must be <= database.max_connections ({})",
                database.min_idle, database.max_connections
            ));
        }
    }

    if let Some(auth) = cfg.auth.as_ref() {
        if auth.admin_email.trim().is_empty() {
            errors.push("auth.admin_email must not be empty".to_string());
        }

        if auth.admin_password.len() < MIN_ADMIN_PASSWORD_LEN {
            errors.push(format!(
                "auth.admin_password must be at least {MIN_ADMIN_PASSWORD_LEN} characters"
            ));
        }

        if auth.jwt_secret.trim().is_empty() {
            errors.push("auth.jwt_secret must not be empty".to_string());
        }

        if auth.jwt_expiration_minutes == 0 {
            errors.push("auth.jwt_expiration_minutes must be > 0".to_string());
        }
    }

    if cfg.oauth.facebook_profile_url.trim().is_empty() {
        errors.push("oauth.facebook_profile_url must not be empty".to_string());
    }

    if cfg.oauth.google_profile_url.trim().is_empty() {
        errors.push("oauth.google_profile_url must not be empty".to_string());
    }

    if let Some(email) = cfg.email.as_ref() {
        if email.host.trim().is_empty() {
            errors.push("email.host must not be empty".to_string());
        }

        if email.from.parse::<lettre::message::Mailbox>().is_err() {
            errors.push(format!("email.from is not a valid mailbox: {}", email.from));
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    bail!("invalid app config:\n- {}", errors.join("\n- "))
}
