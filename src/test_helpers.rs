use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use sea_orm::DatabaseConnection;

use crate::{
    auth::{
        jwt::{JwtKeys, encode_token, make_access_claims},
        providers::IdentityProviders,
    },
    config::{AppConfig, AuthConfig, RunMode},
    db::entities::{password_reset_token, user},
    email::EmailSender,
    routes::router,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_ACCESS_TTL_MINUTES: u32 = 15;

/// Mail sender that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    fn record(&self, entry: String) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(entry);
        }
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send_password_reset(
        &self,
        reset: &password_reset_token::Model,
    ) -> anyhow::Result<()> {
        self.record(format!("reset:{}:{}", reset.user_email, reset.reset_token));
        Ok(())
    }

    async fn send_password_change_email(&self, user: &user::Model) -> anyhow::Result<()> {
        self.record(format!("changed:{}", user.email));
        Ok(())
    }
}

pub fn test_config(run_mode: RunMode) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.general.run_mode = run_mode;
    cfg.auth = Some(AuthConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_expiration_minutes: TEST_ACCESS_TTL_MINUTES,
        admin_email: "admin@example.com".to_string(),
        admin_password: "adminpassword".to_string(),
    });
    cfg
}

pub fn test_state(
    db: DatabaseConnection,
    run_mode: RunMode,
    identity_providers: IdentityProviders,
    mailer: Arc<dyn EmailSender>,
) -> Arc<AppState> {
    match AppState::new(test_config(run_mode), db, identity_providers, mailer) {
        Ok(state) => state,
        Err(err) => panic!("test state should build: {err}"),
    }
}

pub fn test_router(db: DatabaseConnection) -> Router {
    router(test_state(
        db,
        RunMode::Test,
        IdentityProviders::new(),
        Arc::new(RecordingMailer::default()),
    ))
}

/// A signed access token for `user_id`, valid from now.
pub fn bearer_for(user_id: &uuid::Uuid) -> String {
    let keys = JwtKeys::from_secret(TEST_JWT_SECRET.as_bytes());
    let claims = make_access_claims(
        user_id,
        TEST_ACCESS_TTL_MINUTES as usize * 60,
        chrono::Utc::now(),
    );
    match encode_token(&keys, &claims) {
        Ok(token) => format!("Bearer {token}"),
        Err(err) => panic!("token should encode: {err}"),
    }
}
