use chrono::{DateTime, Duration, Utc};

use crate::{
    auth::{
        Claims, TokenBundle,
        jwt::{JwtKeys, decode_access, encode_token, make_access_claims},
        tokens::opaque_token,
    },
    db::dao::RefreshTokenDao,
    db::entities::user,
    error::AppError,
    services::user_service::{UserService, normalize_email},
};

pub const REFRESH_TTL_DAYS: i64 = 30;
pub const TOKEN_TYPE: &str = "Bearer";

const BAD_CREDENTIALS: &str = "Incorrect email or password";
const BAD_REFRESH_PAIR: &str = "Incorrect email or refreshToken";
const INVALID_REFRESH: &str = "Invalid refresh token";

/// A verified user together with a freshly signed access token.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub user: user::Model,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TokenService {
    user_service: UserService,
    refresh_token_dao: RefreshTokenDao,
    jwt: JwtKeys,
    access_ttl_secs: usize,
}

impl TokenService {
    pub fn new(
        user_service: UserService,
        refresh_token_dao: RefreshTokenDao,
        jwt: JwtKeys,
        access_ttl_secs: usize,
    ) -> Self {
        Self {
            user_service,
            refresh_token_dao,
            jwt,
            access_ttl_secs,
        }
    }

    pub fn grant_access(&self, user: user::Model) -> Result<AccessGrant, AppError> {
        self.grant_access_at(user, Utc::now())
    }

    pub fn grant_access_at(
        &self,
        user: user::Model,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, AppError> {
        let claims = make_access_claims(&user.id, self.access_ttl_secs, now);
        let access_token = encode_token(&self.jwt, &claims)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AppError::internal("access token expiry out of range"))?;

        Ok(AccessGrant {
            user,
            access_token,
            expires_at,
        })
    }

    /// Persists a new refresh token for the grant's user and packages both tokens.
    pub async fn bundle(&self, grant: &AccessGrant) -> Result<TokenBundle, AppError> {
        let now = Utc::now();
        let refresh = self
            .refresh_token_dao
            .create_refresh_token(
                &opaque_token(&grant.user.id),
                &grant.user.id,
                &grant.user.email,
                (now + Duration::days(REFRESH_TTL_DAYS)).fixed_offset(),
            )
            .await?;

        Ok(TokenBundle {
            token_type: TOKEN_TYPE.to_string(),
            access_token: grant.access_token.clone(),
            refresh_token: refresh.token,
            expires_in: grant.expires_at,
        })
    }

    pub async fn mint(&self, user: user::Model) -> Result<TokenBundle, AppError> {
        let grant = self.grant_access(user)?;
        self.bundle(&grant).await
    }

    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AccessGrant, AppError> {
        let user = self
            .user_service
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized(BAD_CREDENTIALS))?;

        if !self
            .user_service
            .hashing()
            .verify(password, &user.password_hash)?
        {
            return Err(AppError::unauthorized(BAD_CREDENTIALS));
        }

        self.grant_access(user)
    }

    pub async fn verify_refresh(
        &self,
        email: &str,
        refresh_token: &str,
    ) -> Result<AccessGrant, AppError> {
        self.verify_refresh_at(email, refresh_token, Utc::now()).await
    }

    /// Consumes the refresh token before looking at its expiry, so a presented
    /// token is gone whatever the outcome.
    pub async fn verify_refresh_at(
        &self,
        email: &str,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessGrant, AppError> {
        let stored = self
            .refresh_token_dao
            .take_by_email_and_token(&normalize_email(email), refresh_token)
            .await?
            .ok_or_else(|| AppError::unauthorized(BAD_REFRESH_PAIR))?;

        if stored.expires_at < now {
            tracing::warn!(user_id = %stored.user_id, "expired refresh token presented");
            return Err(AppError::unauthorized(INVALID_REFRESH));
        }

        let user = self
            .user_service
            .find_by_id(&stored.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized(INVALID_REFRESH))?;

        self.grant_access_at(user, now)
    }

    pub fn verify_access(&self, access_token: &str) -> Result<Claims, AppError> {
        decode_access(&self.jwt, access_token)
    }
}
