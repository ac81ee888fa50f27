use uuid::Uuid;

use crate::{
    auth::{Role, password::PasswordHashing, providers::OAuthIdentity, tokens::random_password},
    config::AuthConfig,
    db::dao::{DaoBase, DaoLayerError, UserChanges, UserDao, UserFields, UserListFilter},
    db::entities::user,
    error::AppError,
};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 30;

const USER_NOT_FOUND: &str = "User does not exist";

/// Input for creating or fully replacing a user. `password` is plaintext.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub picture: Option<String>,
}

/// Partial update. `password` is plaintext and re-hashed before storage.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

pub fn parse_user_id(raw_id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw_id).map_err(|_| AppError::not_found(USER_NOT_FOUND))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string())
}

#[derive(Clone)]
pub struct UserService {
    user_dao: UserDao,
    hashing: PasswordHashing,
}

impl UserService {
    pub fn new(user_dao: UserDao, hashing: PasswordHashing) -> Self {
        Self { user_dao, hashing }
    }

    pub fn hashing(&self) -> &PasswordHashing {
        &self.hashing
    }

    /// Loads a user from a path segment; a malformed id reads as absent.
    pub async fn get(&self, raw_id: &str) -> Result<user::Model, AppError> {
        self.load(&parse_user_id(raw_id)?).await
    }

    pub async fn load(&self, id: &Uuid) -> Result<user::Model, AppError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(USER_NOT_FOUND))
    }

    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<user::Model>, AppError> {
        match self.user_dao.find_by_id(*id).await {
            Ok(model) => Ok(Some(model)),
            Err(DaoLayerError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(self.user_dao.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, AppError> {
        let email = normalize_email(&new_user.email);
        if self.user_dao.find_by_email(&email).await?.is_some() {
            return Err(AppError::duplicate_email());
        }

        let fields = UserFields {
            email,
            password_hash: self.hashing.hash(&new_user.password)?,
            name: trimmed(new_user.name),
            role: new_user.role.unwrap_or_default().as_str().to_string(),
            picture: trimmed(new_user.picture),
            facebook_id: None,
            google_id: None,
        };
        self.user_dao.create_user(fields).await.map_err(write_error)
    }

    pub async fn list(
        &self,
        page: Option<u64>,
        per_page: Option<u64>,
        filter: UserFilter,
    ) -> Result<Vec<user::Model>, AppError> {
        let filter = UserListFilter {
            name: filter.name,
            email: filter.email.as_deref().map(normalize_email),
            role: filter.role.map(|role| role.as_str().to_string()),
        };
        let page = self
            .user_dao
            .list(
                page.unwrap_or(DEFAULT_PAGE),
                per_page.unwrap_or(DEFAULT_PER_PAGE),
                filter,
            )
            .await?;
        Ok(page.data)
    }

    /// Merges `patch` into `existing`. Only an admin actor may change roles; for
    /// anyone else the requested role is ignored.
    pub async fn update(
        &self,
        existing: &user::Model,
        patch: UserPatch,
        actor_role: Role,
    ) -> Result<user::Model, AppError> {
        let email = patch.email.as_deref().map(normalize_email);
        if let Some(email) = email.as_deref() {
            self.ensure_email_free(email, &existing.id).await?;
        }
        let password_hash = match patch.password.as_deref() {
            Some(password) => Some(self.hashing.hash(password)?),
            None => None,
        };

        let changes = UserChanges {
            email,
            password_hash,
            name: trimmed(patch.name),
            role: allowed_role(patch.role, actor_role).map(|role| role.as_str().to_string()),
            picture: trimmed(patch.picture),
            facebook_id: None,
            google_id: None,
        };
        if changes.is_empty() {
            return Ok(existing.clone());
        }

        self.user_dao
            .apply_changes(&existing.id, changes)
            .await
            .map_err(write_error)
    }

    /// Overwrites every mutable field of `existing`, keeping its id. Omitted fields
    /// and linked provider ids are cleared.
    pub async fn replace(
        &self,
        existing: &user::Model,
        data: NewUser,
        actor_role: Role,
    ) -> Result<user::Model, AppError> {
        let fields = self.replacement_fields(data, actor_role)?;
        self.ensure_email_free(&fields.email, &existing.id).await?;

        self.user_dao
            .overwrite(&existing.id, fields)
            .await
            .map_err(write_error)
    }

    /// Column values a replace writes. A role the actor may not grant falls back to `user`.
    fn replacement_fields(
        &self,
        data: NewUser,
        actor_role: Role,
    ) -> Result<UserFields, AppError> {
        Ok(UserFields {
            email: normalize_email(&data.email),
            password_hash: self.hashing.hash(&data.password)?,
            name: trimmed(data.name),
            role: allowed_role(data.role, actor_role)
                .unwrap_or_default()
                .as_str()
                .to_string(),
            picture: trimmed(data.picture),
            facebook_id: None,
            google_id: None,
        })
    }

    pub async fn remove(&self, id: &Uuid) -> Result<(), AppError> {
        match self.user_dao.delete(*id).await {
            Ok(_) => Ok(()),
            Err(DaoLayerError::NotFound { .. }) => Err(AppError::not_found(USER_NOT_FOUND)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn set_password(
        &self,
        user_id: &Uuid,
        password: &str,
    ) -> Result<user::Model, AppError> {
        let changes = UserChanges {
            password_hash: Some(self.hashing.hash(password)?),
            ..Default::default()
        };
        match self.user_dao.apply_changes(user_id, changes).await {
            Ok(user) => Ok(user),
            Err(DaoLayerError::NotFound { .. }) => Err(AppError::not_found(USER_NOT_FOUND)),
            Err(err) => Err(err.into()),
        }
    }

    /// Finds the account linked to the provider id, or owning the same email, and
    /// links it; otherwise creates a new account with an unguessable password.
    pub async fn oauth_login(&self, identity: &OAuthIdentity) -> Result<user::Model, AppError> {
        let email = normalize_email(&identity.email);
        let existing = self
            .user_dao
            .find_by_provider_or_email(identity.provider.user_column(), &identity.id, &email)
            .await?;

        let Some(existing) = existing else {
            let mut fields = UserFields {
                email,
                password_hash: self.hashing.hash(&random_password())?,
                name: trimmed(identity.name.clone()),
                role: Role::User.as_str().to_string(),
                picture: trimmed(identity.picture.clone()),
                facebook_id: None,
                google_id: None,
            };
            link_provider(&mut fields.facebook_id, &mut fields.google_id, identity);
            let user = self.user_dao.create_user(fields).await.map_err(write_error)?;
            tracing::info!(
                user_id = %user.id,
                provider = identity.provider.as_str(),
                "created user from oauth login"
            );
            return Ok(user);
        };

        let mut changes = UserChanges::default();
        link_provider(&mut changes.facebook_id, &mut changes.google_id, identity);
        if existing.name.is_none() {
            changes.name = trimmed(identity.name.clone());
        }
        if existing.picture.is_none() {
            changes.picture = trimmed(identity.picture.clone());
        }

        self.user_dao
            .apply_changes(&existing.id, changes)
            .await
            .map_err(write_error)
    }

    pub async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        if let Some(existing) = self
            .find_by_email(&cfg.admin_email)
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?
        {
            tracing::info!("admin user already present: {}", existing.email);
            return Ok(());
        }

        let user = self
            .create(NewUser {
                email: cfg.admin_email.clone(),
                password: cfg.admin_password.clone(),
                role: Some(Role::Admin),
                ..Default::default()
            })
            .await
            .map_err(|err| anyhow::anyhow!("admin seed failed: {err}"))?;
        tracing::info!("seeded admin user {}", user.email);
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, owner: &Uuid) -> Result<(), AppError> {
        match self.user_dao.find_by_email(email).await? {
            Some(other) if other.id != *owner => Err(AppError::duplicate_email()),
            _ => Ok(()),
        }
    }
}

fn allowed_role(requested: Option<Role>, actor_role: Role) -> Option<Role> {
    requested.filter(|_| actor_role == Role::Admin)
}

fn link_provider(
    facebook_id: &mut Option<String>,
    google_id: &mut Option<String>,
    identity: &OAuthIdentity,
) {
    use crate::auth::providers::OAuthProviderId;

    match identity.provider {
        OAuthProviderId::Facebook => *facebook_id = Some(identity.id.clone()),
        OAuthProviderId::Google => *google_id = Some(identity.id.clone()),
    }
}

// The only unique column on users is email.
fn write_error(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::UniqueViolation(_) => AppError::duplicate_email(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use sea_orm::{DatabaseBackend, IntoMockRow, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use crate::{
        auth::{
            Role,
            password::PasswordHashing,
            providers::{OAuthIdentity, OAuthProviderId},
        },
        config::RunMode,
        db::dao::{DaoBase, UserDao},
        db::entities::user,
        error::AppError,
    };

    use super::{NewUser, UserFilter, UserPatch, UserService, normalize_email};

    struct ServiceFixtureBuilder {
        mock: MockDatabase,
    }

    impl ServiceFixtureBuilder {
        fn new() -> Self {
            Self {
                mock: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn with_query_results<T, I, II>(mut self, sets: II) -> Self
        where
            T: IntoMockRow,
            I: IntoIterator<Item = T>,
            II: IntoIterator<Item = I>,
        {
            self.mock = self.mock.append_query_results(sets);
            self
        }

        fn with_exec_result(mut self, rows_affected: u64) -> Self {
            self.mock = self.mock.append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }]);
            self
        }

        fn build(self) -> UserService {
            let db = self.mock.into_connection();
            UserService::new(UserDao::new(&db), PasswordHashing::for_mode(RunMode::Test))
        }
    }

    fn ts() -> chrono::DateTime<chrono::FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("offset should be valid")
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .expect("timestamp should be valid")
    }

    fn user_model(email: &str, role: &str) -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: None,
            role: role.to_string(),
            picture: None,
            facebook_id: None,
            google_id: None,
        }
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[tokio::test]
    async fn get_treats_malformed_id_as_missing() {
        let service = ServiceFixtureBuilder::new().build();

        let err = service.get("not-a-uuid").await.expect_err("lookup should fail");
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "User does not exist");
    }

    #[tokio::test]
    async fn get_reports_absent_user() {
        let service = ServiceFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .build();

        let err = service
            .get(&Uuid::new_v4().to_string())
            .await
            .expect_err("lookup should fail");
        assert_eq!(err.message(), "User does not exist");
    }

    #[tokio::test]
    async fn create_rejects_existing_email() {
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[user_model("alice@example.com", "user")]])
            .build();

        let err = service
            .create(NewUser {
                email: "Alice@example.com".to_string(),
                password: "secret1".to_string(),
                ..Default::default()
            })
            .await
            .expect_err("duplicate should fail");

        assert!(matches!(err, AppError::Conflict { .. }));
        assert_eq!(err.field_errors()[0].field, "email");
    }

    #[tokio::test]
    async fn create_returns_inserted_user() {
        let inserted = user_model("alice@example.com", "user");
        let service = ServiceFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .with_query_results([[inserted.clone()]])
            .build();

        let created = service
            .create(NewUser {
                email: " ALICE@example.com".to_string(),
                password: "secret1".to_string(),
                ..Default::default()
            })
            .await
            .expect("create should succeed");
        assert_eq!(created.id, inserted.id);
    }

    #[tokio::test]
    async fn update_by_non_admin_keeps_role() {
        let existing = user_model("alice@example.com", "user");
        let service = ServiceFixtureBuilder::new().build();

        let unchanged = service
            .update(
                &existing,
                UserPatch {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Role::User,
            )
            .await
            .expect("update should succeed");

        assert_eq!(unchanged.role, "user");
        assert_eq!(unchanged, existing);
    }

    #[tokio::test]
    async fn update_by_admin_changes_role() {
        let existing = user_model("alice@example.com", "user");
        let mut promoted = existing.clone();
        promoted.role = "admin".to_string();
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[existing.clone()]])
            .with_query_results([[promoted]])
            .build();

        let updated = service
            .update(
                &existing,
                UserPatch {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Role::Admin,
            )
            .await
            .expect("update should succeed");
        assert_eq!(updated.role, "admin");
    }

    #[test]
    fn replace_by_non_admin_strips_role_and_clears_optional_fields() {
        let service = ServiceFixtureBuilder::new().build();

        let fields = service
            .replacement_fields(
                NewUser {
                    email: "Alice@Example.com".to_string(),
                    password: "secret1".to_string(),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Role::User,
            )
            .expect("fields should build");

        assert_eq!(fields.email, "alice@example.com");
        assert_eq!(fields.role, "user");
        assert_eq!(fields.name, None);
        assert_eq!(fields.picture, None);
        assert_eq!(fields.facebook_id, None);
        assert_eq!(fields.google_id, None);
        assert_ne!(fields.password_hash, "secret1");
    }

    #[test]
    fn replace_by_admin_grants_role() {
        let service = ServiceFixtureBuilder::new().build();

        let fields = service
            .replacement_fields(
                NewUser {
                    email: "alice@example.com".to_string(),
                    password: "secret1".to_string(),
                    name: Some(" Alice ".to_string()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Role::Admin,
            )
            .expect("fields should build");

        assert_eq!(fields.role, "admin");
        assert_eq!(fields.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn replace_overwrites_existing_user() {
        let mut existing = user_model("alice@example.com", "user");
        existing.facebook_id = Some("fb-1".to_string());
        let mut replaced = user_model("alice@example.com", "user");
        replaced.id = existing.id;
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[existing.clone()]])
            .with_query_results([[existing.clone()]])
            .with_query_results([[replaced.clone()]])
            .build();

        let user = service
            .replace(
                &existing,
                NewUser {
                    email: "alice@example.com".to_string(),
                    password: "secret1".to_string(),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
                Role::User,
            )
            .await
            .expect("replace should succeed");

        assert_eq!(user.id, existing.id);
        assert_eq!(user.role, "user");
        assert_eq!(user.facebook_id, None);
    }

    #[tokio::test]
    async fn replace_rejects_email_owned_by_someone_else() {
        let existing = user_model("alice@example.com", "user");
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[user_model("bob@example.com", "user")]])
            .build();

        let err = service
            .replace(
                &existing,
                NewUser {
                    email: "bob@example.com".to_string(),
                    password: "secret1".to_string(),
                    ..Default::default()
                },
                Role::Admin,
            )
            .await
            .expect_err("replace should fail");
        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_someone_else() {
        let existing = user_model("alice@example.com", "user");
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[user_model("bob@example.com", "user")]])
            .build();

        let err = service
            .update(
                &existing,
                UserPatch {
                    email: Some("bob@example.com".to_string()),
                    ..Default::default()
                },
                Role::User,
            )
            .await
            .expect_err("update should fail");
        assert_eq!(err.field_errors()[0].messages[0], "\"email\" already exists");
    }

    #[tokio::test]
    async fn list_rejects_oversized_page() {
        let service = ServiceFixtureBuilder::new().build();

        let err = service
            .list(Some(1), Some(500), UserFilter::default())
            .await
            .expect_err("page size should be rejected");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn oauth_login_links_onto_existing_email() {
        let existing = user_model("alice@example.com", "user");
        let mut linked = existing.clone();
        linked.google_id = Some("g-1".to_string());
        linked.name = Some("Alice".to_string());
        let service = ServiceFixtureBuilder::new()
            .with_query_results([[existing.clone()]])
            .with_query_results([[existing.clone()]])
            .with_query_results([[linked]])
            .build();

        let user = service
            .oauth_login(&OAuthIdentity {
                provider: OAuthProviderId::Google,
                id: "g-1".to_string(),
                email: "alice@example.com".to_string(),
                name: Some("Alice".to_string()),
                picture: None,
            })
            .await
            .expect("oauth login should succeed");

        assert_eq!(user.id, existing.id);
        assert_eq!(user.google_id.as_deref(), Some("g-1"));
    }

    #[tokio::test]
    async fn remove_reports_missing_user() {
        let service = ServiceFixtureBuilder::new().with_exec_result(0).build();

        let err = service
            .remove(&Uuid::new_v4())
            .await
            .expect_err("delete should fail");
        assert_eq!(err.message(), "User does not exist");
    }
}
