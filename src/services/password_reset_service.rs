use chrono::{DateTime, Duration, Utc};

use crate::{
    auth::tokens::opaque_token,
    db::dao::PasswordResetTokenDao,
    db::entities::{password_reset_token, user},
    error::AppError,
    services::user_service::normalize_email,
};

pub const RESET_TTL_HOURS: i64 = 2;

#[derive(Clone)]
pub struct PasswordResetService {
    reset_token_dao: PasswordResetTokenDao,
}

impl PasswordResetService {
    pub fn new(reset_token_dao: PasswordResetTokenDao) -> Self {
        Self { reset_token_dao }
    }

    pub async fn issue(&self, user: &user::Model) -> Result<password_reset_token::Model, AppError> {
        self.issue_at(user, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        user: &user::Model,
        now: DateTime<Utc>,
    ) -> Result<password_reset_token::Model, AppError> {
        let expires_at = (now + Duration::hours(RESET_TTL_HOURS)).fixed_offset();
        Ok(self
            .reset_token_dao
            .create_reset_token(&opaque_token(&user.id), &user.id, &user.email, expires_at)
            .await?)
    }

    pub async fn consume(
        &self,
        email: &str,
        reset_token: &str,
    ) -> Result<password_reset_token::Model, AppError> {
        self.consume_at(email, reset_token, Utc::now()).await
    }

    /// The record is deleted before its expiry is checked; an expired token is
    /// spent all the same.
    pub async fn consume_at(
        &self,
        email: &str,
        reset_token: &str,
        now: DateTime<Utc>,
    ) -> Result<password_reset_token::Model, AppError> {
        let stored = self
            .reset_token_dao
            .take_by_email_and_token(&normalize_email(email), reset_token)
            .await?
            .ok_or_else(|| AppError::unauthorized("Cannot find matching reset token"))?;

        if stored.expires_at < now {
            return Err(AppError::unauthorized("Reset token is expired"));
        }
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use uuid::Uuid;

    use crate::db::{
        dao::{DaoBase, PasswordResetTokenDao},
        entities::{password_reset_token, user},
    };

    use super::{PasswordResetService, RESET_TTL_HOURS};

    fn issued_at() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn reset_model() -> password_reset_token::Model {
        let user_id = Uuid::new_v4();
        password_reset_token::Model {
            id: Uuid::new_v4(),
            created_at: issued_at().fixed_offset(),
            updated_at: issued_at().fixed_offset(),
            reset_token: format!("{user_id}.abc"),
            user_id,
            user_email: "alice@example.com".to_string(),
            expires_at: (issued_at() + Duration::hours(RESET_TTL_HOURS)).fixed_offset(),
        }
    }

    fn service_returning(rows: Vec<password_reset_token::Model>) -> PasswordResetService {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([rows])
            .into_connection();
        PasswordResetService::new(PasswordResetTokenDao::new(&db))
    }

    #[tokio::test]
    async fn issue_persists_two_hour_token() {
        let stored = reset_model();
        let service = service_returning(vec![stored.clone()]);
        let now = Utc::now().fixed_offset();
        let user = user::Model {
            id: stored.user_id,
            created_at: now,
            updated_at: now,
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            name: None,
            role: "user".to_string(),
            picture: None,
            facebook_id: None,
            google_id: None,
        };

        let issued = service
            .issue_at(&user, issued_at())
            .await
            .expect("issue should succeed");
        assert_eq!(issued.user_email, "alice@example.com");
        assert_eq!(issued.expires_at - issued.created_at, Duration::hours(2));
    }

    #[tokio::test]
    async fn consume_just_before_expiry_succeeds() {
        let stored = reset_model();
        let service = service_returning(vec![stored.clone()]);
        let at = issued_at() + Duration::hours(2) - Duration::seconds(1);

        let consumed = service
            .consume_at("alice@example.com", &stored.reset_token, at)
            .await
            .expect("token should still be valid");
        assert_eq!(consumed.user_id, stored.user_id);
    }

    #[tokio::test]
    async fn consume_just_after_expiry_fails() {
        let stored = reset_model();
        let service = service_returning(vec![stored.clone()]);
        let at = issued_at() + Duration::hours(2) + Duration::seconds(1);

        let err = service
            .consume_at("alice@example.com", &stored.reset_token, at)
            .await
            .expect_err("token should be expired");
        assert_eq!(err.message(), "Reset token is expired");
    }

    #[tokio::test]
    async fn consume_without_match_fails() {
        let service = service_returning(Vec::new());

        let err = service
            .consume_at("alice@example.com", "missing", issued_at())
            .await
            .expect_err("nothing should match");
        assert_eq!(err.message(), "Cannot find matching reset token");
    }
}
