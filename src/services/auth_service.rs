use crate::{
    auth::{
        Role, TokenBundle,
        providers::{IdentityProviders, OAuthProviderId},
    },
    db::entities::user,
    email::EmailSender,
    error::AppError,
    services::{ServiceContext, user_service::NewUser},
};

/// A user and the credentials just issued to them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: user::Model,
    pub token: TokenBundle,
}

#[derive(Clone)]
pub struct AuthService<'a> {
    services: ServiceContext,
    providers: &'a IdentityProviders,
    mailer: &'a dyn EmailSender,
}

impl<'a> AuthService<'a> {
    pub fn new(
        services: ServiceContext,
        providers: &'a IdentityProviders,
        mailer: &'a dyn EmailSender,
    ) -> Self {
        Self {
            services,
            providers,
            mailer,
        }
    }

    /// Self-service sign-up; the requested role is never honoured.
    pub async fn register(&self, new_user: NewUser) -> Result<AuthSession, AppError> {
        let user = self
            .services
            .user()
            .create(NewUser {
                role: Some(Role::User),
                ..new_user
            })
            .await?;
        tracing::info!(user_id = %user.id, "registered user");

        let token = self.services.tokens().mint(user.clone()).await?;
        Ok(AuthSession { user, token })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let tokens = self.services.tokens();
        let grant = tokens.verify_credentials(email, password).await?;
        let token = tokens.bundle(&grant).await?;
        Ok(AuthSession {
            user: grant.user,
            token,
        })
    }

    pub async fn oauth_login(
        &self,
        provider: OAuthProviderId,
        access_token: &str,
    ) -> Result<AuthSession, AppError> {
        let identity = self
            .providers
            .get(provider)?
            .fetch_identity(access_token)
            .await?;
        let user = self.services.user().oauth_login(&identity).await?;

        let token = self.services.tokens().mint(user.clone()).await?;
        Ok(AuthSession { user, token })
    }

    /// Redeems a refresh token and issues a new pair in its place.
    pub async fn refresh(&self, email: &str, refresh_token: &str) -> Result<TokenBundle, AppError> {
        let tokens = self.services.tokens();
        let grant = tokens.verify_refresh(email, refresh_token).await?;
        tokens.bundle(&grant).await
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let user = self
            .services
            .user()
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("No account found with that email"))?;

        let reset = self.services.password_reset().issue(&user).await?;
        if let Err(err) = self.mailer.send_password_reset(&reset).await {
            tracing::warn!(user_id = %user.id, error = %err, "failed to send password reset email");
        }
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        password: &str,
        reset_token: &str,
    ) -> Result<(), AppError> {
        let reset = self
            .services
            .password_reset()
            .consume(email, reset_token)
            .await?;
        let user = self
            .services
            .user()
            .set_password(&reset.user_id, password)
            .await?;
        tracing::info!(user_id = %user.id, "password reset completed");

        if let Err(err) = self.mailer.send_password_change_email(&user).await {
            tracing::warn!(
                user_id = %user.id,
                error = %err,
                "failed to send password change email"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, IntoMockRow, MockDatabase};
    use uuid::Uuid;

    use crate::{
        auth::{
            jwt::JwtKeys,
            password::PasswordHashing,
            providers::{IdentityProvider, IdentityProviders, OAuthIdentity, OAuthProviderId},
        },
        config::RunMode,
        db::entities::{password_reset_token, refresh_token, user},
        email::EmailSender,
        error::AppError,
        services::{ServiceContext, user_service::NewUser},
    };

    use super::AuthService;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EmailSender for RecordingMailer {
        async fn send_password_reset(
            &self,
            reset: &password_reset_token::Model,
        ) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("mailer lock")
                .push(format!("reset:{}", reset.user_email));
            Ok(())
        }

        async fn send_password_change_email(&self, user: &user::Model) -> anyhow::Result<()> {
            self.sent
                .lock()
                .expect("mailer lock")
                .push(format!("changed:{}", user.email));
            Ok(())
        }
    }

    struct StaticGoogle;

    #[async_trait]
    impl IdentityProvider for StaticGoogle {
        fn id(&self) -> OAuthProviderId {
            OAuthProviderId::Google
        }

        async fn fetch_identity(&self, access_token: &str) -> Result<OAuthIdentity, AppError> {
            if access_token != "good-token" {
                return Err(AppError::unauthorized("Unauthorized"));
            }
            Ok(OAuthIdentity {
                provider: OAuthProviderId::Google,
                id: "g-1".to_string(),
                email: "alice@example.com".to_string(),
                name: Some("Alice".to_string()),
                picture: None,
            })
        }
    }

    struct AuthFixtureBuilder {
        mock: MockDatabase,
    }

    impl AuthFixtureBuilder {
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

        fn build(self) -> ServiceContext {
            let db = self.mock.into_connection();
            ServiceContext::new(
                &db,
                PasswordHashing::for_mode(RunMode::Test),
                JwtKeys::from_secret(b"test-secret"),
                900,
            )
        }
    }

    fn providers() -> IdentityProviders {
        IdentityProviders::new()
            .with_provider(Arc::new(StaticGoogle))
            .expect("registration should succeed")
    }

    fn user_model(email: &str) -> user::Model {
        let now = Utc::now().fixed_offset();
        user::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: None,
            role: "user".to_string(),
            picture: None,
            facebook_id: None,
            google_id: None,
        }
    }

    fn refresh_model(user: &user::Model) -> refresh_token::Model {
        let now = Utc::now().fixed_offset();
        refresh_token::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            token: format!("{}.abc", user.id),
            user_id: user.id,
            user_email: user.email.clone(),
            expires_at: now + Duration::days(30),
        }
    }

    fn reset_model(user: &user::Model) -> password_reset_token::Model {
        let now = Utc::now().fixed_offset();
        password_reset_token::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            reset_token: format!("{}.def", user.id),
            user_id: user.id,
            user_email: user.email.clone(),
            expires_at: now + Duration::hours(2),
        }
    }

    #[tokio::test]
    async fn register_creates_user_and_issues_tokens() {
        let created = user_model("alice@example.com");
        let services = AuthFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .with_query_results([[created.clone()]])
            .with_query_results([[refresh_model(&created)]])
            .build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        let session = auth
            .register(NewUser {
                email: "alice@example.com".to_string(),
                password: "secret1".to_string(),
                role: Some(crate::auth::Role::Admin),
                ..Default::default()
            })
            .await
            .expect("register should succeed");

        assert_eq!(session.user.id, created.id);
        assert_eq!(session.token.token_type, "Bearer");
        assert!(session.token.refresh_token.starts_with(&created.id.to_string()));
    }

    #[tokio::test]
    async fn oauth_login_rejects_bad_provider_token() {
        let services = AuthFixtureBuilder::new().build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        let err = auth
            .oauth_login(OAuthProviderId::Google, "bad-token")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn oauth_login_with_unconfigured_provider_is_internal() {
        let services = AuthFixtureBuilder::new().build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        let err = auth
            .oauth_login(OAuthProviderId::Facebook, "good-token")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn send_password_reset_rejects_unknown_email() {
        let services = AuthFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        let err = auth
            .send_password_reset("nobody@example.com")
            .await
            .expect_err("request should fail");
        assert_eq!(err.message(), "No account found with that email");
        assert!(mailer.sent.lock().expect("mailer lock").is_empty());
    }

    #[tokio::test]
    async fn send_password_reset_emails_the_token() {
        let user = user_model("alice@example.com");
        let services = AuthFixtureBuilder::new()
            .with_query_results([[user.clone()]])
            .with_query_results([[reset_model(&user)]])
            .build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        auth.send_password_reset("alice@example.com")
            .await
            .expect("request should succeed");
        assert_eq!(
            mailer.sent.lock().expect("mailer lock").as_slice(),
            ["reset:alice@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn reset_password_updates_hash_and_notifies() {
        let user = user_model("alice@example.com");
        let services = AuthFixtureBuilder::new()
            .with_query_results([[reset_model(&user)]])
            .with_query_results([[user.clone()]])
            .with_query_results([[user.clone()]])
            .build();
        let providers = providers();
        let mailer = RecordingMailer::default();
        let auth = AuthService::new(services, &providers, &mailer);

        auth.reset_password("alice@example.com", "newsecret", &format!("{}.def", user.id))
            .await
            .expect("reset should succeed");
        assert_eq!(
            mailer.sent.lock().expect("mailer lock").as_slice(),
            ["changed:alice@example.com".to_string()]
        );
    }
}
