use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::password_reset_token::{self, Entity as PasswordResetToken};

#[derive(Clone)]
pub struct PasswordResetTokenDao {
    db: DatabaseConnection,
}

impl DaoBase for PasswordResetTokenDao {
    type Entity = PasswordResetToken;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PasswordResetTokenDao {
    pub async fn create_reset_token(
        &self,
        reset_token: &str,
        user_id: &Uuid,
        user_email: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<password_reset_token::Model> {
        let model = password_reset_token::ActiveModel {
            reset_token: Set(reset_token.to_string()),
            user_id: Set(*user_id),
            user_email: Set(user_email.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn take_by_email_and_token(
        &self,
        user_email: &str,
        reset_token: &str,
    ) -> DaoResult<Option<password_reset_token::Model>> {
        let user_email = user_email.to_string();
        let reset_token = reset_token.to_string();
        self.take_one(move |delete| {
            delete
                .filter(password_reset_token::Column::UserEmail.eq(user_email))
                .filter(password_reset_token::Column::ResetToken.eq(reset_token))
        })
        .await
    }
}
