use sea_orm::DatabaseConnection;

use crate::{
    auth::{jwt::JwtKeys, password::PasswordHashing, providers::IdentityProviders},
    db::dao::DaoContext,
    email::EmailSender,
    services::{
        auth_service::AuthService, password_reset_service::PasswordResetService,
        token_service::TokenService, user_service::UserService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    hashing: PasswordHashing,
    jwt: JwtKeys,
    access_ttl_secs: usize,
}

impl ServiceContext {
    pub fn new(
        db: &DatabaseConnection,
        hashing: PasswordHashing,
        jwt: JwtKeys,
        access_ttl_secs: usize,
    ) -> Self {
        Self {
            daos: DaoContext::new(db),
            hashing,
            jwt,
            access_ttl_secs,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            &state.db,
            state.hashing.clone(),
            state.jwt.clone(),
            state.access_ttl_secs,
        )
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.hashing.clone())
    }

    pub fn tokens(&self) -> TokenService {
        TokenService::new(
            self.user(),
            self.daos.refresh_token(),
            self.jwt.clone(),
            self.access_ttl_secs,
        )
    }

    pub fn password_reset(&self) -> PasswordResetService {
        PasswordResetService::new(self.daos.password_reset_token())
    }

    pub fn auth<'a>(
        &self,
        providers: &'a IdentityProviders,
        mailer: &'a dyn EmailSender,
    ) -> AuthService<'a> {
        AuthService::new(self.clone(), providers, mailer)
    }
}
