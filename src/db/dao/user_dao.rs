use sea_orm::{ColumnTrait, Condition, DatabaseConnection, QueryFilter, Set};
use uuid::Uuid;

use super::{ColumnFilter, DaoBase, DaoResult, FilterOp, PaginatedResponse};
use crate::db::entities::user as entity;
use crate::db::entities::{prelude::User, user};

/// Every stored attribute of a user apart from the generated columns.
#[derive(Debug, Clone, Default)]
pub struct UserFields {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: String,
    pub picture: Option<String>,
    pub facebook_id: Option<String>,
    pub google_id: Option<String>,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub picture: Option<String>,
    pub facebook_id: Option<String>,
    pub google_id: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.name.is_none()
            && self.role.is_none()
            && self.picture.is_none()
            && self.facebook_id.is_none()
            && self.google_id.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl UserDao {
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<user::Model>> {
        let email = email.to_string();
        self.find(1, 1, move |query| {
            query.filter(entity::Column::Email.eq(email))
        })
        .await
        .map(|response| response.data.into_iter().next())
    }

    /// Looks a user up by an OAuth provider id or by email. A provider id match wins
    /// when two different rows qualify.
    pub async fn find_by_provider_or_email(
        &self,
        provider_column: entity::Column,
        provider_user_id: &str,
        email: &str,
    ) -> DaoResult<Option<user::Model>> {
        let provider_user_id = provider_user_id.to_string();
        let email = email.to_string();
        let wanted = provider_user_id.clone();
        let candidates = self
            .find(1, 2, move |query| {
                query.filter(
                    Condition::any()
                        .add(provider_column.eq(provider_user_id))
                        .add(entity::Column::Email.eq(email)),
                )
            })
            .await?
            .data;

        let linked = candidates.iter().position(|candidate| {
            let id = match provider_column {
                entity::Column::FacebookId => candidate.facebook_id.as_deref(),
                entity::Column::GoogleId => candidate.google_id.as_deref(),
                _ => None,
            };
            id == Some(wanted.as_str())
        });

        Ok(match linked {
            Some(index) => candidates.into_iter().nth(index),
            None => candidates.into_iter().next(),
        })
    }

    pub async fn create_user(&self, fields: UserFields) -> DaoResult<user::Model> {
        let model = user::ActiveModel {
            email: Set(fields.email),
            password_hash: Set(fields.password_hash),
            name: Set(fields.name),
            role: Set(fields.role),
            picture: Set(fields.picture),
            facebook_id: Set(fields.facebook_id),
            google_id: Set(fields.google_id),
            ..Default::default()
        };
        self.create(model).await
    }

    /// Replaces every user-controlled column of the row.
    pub async fn overwrite(&self, id: &Uuid, fields: UserFields) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            active.email = Set(fields.email);
            active.password_hash = Set(fields.password_hash);
            active.name = Set(fields.name);
            active.role = Set(fields.role);
            active.picture = Set(fields.picture);
            active.facebook_id = Set(fields.facebook_id);
            active.google_id = Set(fields.google_id);
        })
        .await
    }

    pub async fn apply_changes(&self, id: &Uuid, changes: UserChanges) -> DaoResult<user::Model> {
        self.update(*id, move |active| {
            if let Some(email) = changes.email {
                active.email = Set(email);
            }
            if let Some(password_hash) = changes.password_hash {
                active.password_hash = Set(password_hash);
            }
            if let Some(name) = changes.name {
                active.name = Set(Some(name));
            }
            if let Some(role) = changes.role {
                active.role = Set(role);
            }
            if let Some(picture) = changes.picture {
                active.picture = Set(Some(picture));
            }
            if let Some(facebook_id) = changes.facebook_id {
                active.facebook_id = Set(Some(facebook_id));
            }
            if let Some(google_id) = changes.google_id {
                active.google_id = Set(Some(google_id));
            }
        })
        .await
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        filter: UserListFilter,
    ) -> DaoResult<PaginatedResponse<user::Model>> {
        let mut filters = Vec::new();
        if let Some(name) = filter.name {
            filters.push(ColumnFilter {
                column: entity::Column::Name,
                op: FilterOp::contains(&name),
            });
        }
        if let Some(email) = filter.email {
            filters.push(ColumnFilter {
                column: entity::Column::Email,
                op: FilterOp::Eq(email.into()),
            });
        }
        if let Some(role) = filter.role {
            filters.push(ColumnFilter {
                column: entity::Column::Role,
                op: FilterOp::Eq(role.into()),
            });
        }

        self.find_with_filters(page, page_size, &filters, |query| query).await
    }
}
