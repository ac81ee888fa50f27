use chrono::{DateTime, FixedOffset};
use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoResult};
use crate::db::entities::refresh_token::{self, Entity as RefreshToken};

#[derive(Clone)]
pub struct RefreshTokenDao {
    db: DatabaseConnection,
}

impl DaoBase for RefreshTokenDao {
    type Entity = RefreshToken;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl RefreshTokenDao {
    pub async fn create_refresh_token(
        &self,
        token: &str,
        user_id: &Uuid,
        user_email: &str,
        expires_at: DateTime<FixedOffset>,
    ) -> DaoResult<refresh_token::Model> {
        let model = refresh_token::ActiveModel {
            token: Set(token.to_string()),
            user_id: Set(*user_id),
            user_email: Set(user_email.to_string()),
            expires_at: Set(expires_at),
            ..Default::default()
        };
        self.create(model).await
    }

    /// Removes and returns the token issued to `user_email`, if any.
    pub async fn take_by_email_and_token(
        &self,
        user_email: &str,
        token: &str,
    ) -> DaoResult<Option<refresh_token::Model>> {
        let user_email = user_email.to_string();
        let token = token.to_string();
        self.take_one(move |delete| {
            delete
                .filter(refresh_token::Column::UserEmail.eq(user_email))
                .filter(refresh_token::Column::Token.eq(token))
        })
        .await
    }
}
