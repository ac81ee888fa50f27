use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;

use crate::{
    auth::{jwt::JwtKeys, password::PasswordHashing, providers::IdentityProviders},
    config::AppConfig,
    email::EmailSender,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
    pub hashing: PasswordHashing,
    pub access_ttl_secs: usize,
    pub identity_providers: IdentityProviders,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        identity_providers: IdentityProviders,
        mailer: Arc<dyn EmailSender>,
    ) -> anyhow::Result<Arc<Self>> {
        let auth = config.auth.as_ref().context("auth config is required")?;
        let jwt = JwtKeys::from_secret(auth.jwt_secret.as_bytes());
        let access_ttl_secs = auth.access_ttl_secs();
        let hashing = PasswordHashing::for_mode(config.run_mode());

        Ok(Arc::new(Self {
            config,
            db,
            jwt,
            hashing,
            access_ttl_secs,
            identity_providers,
            mailer,
        }))
    }
}
