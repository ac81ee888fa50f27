use std::sync::Arc;

use axum::{extract::FromRequestParts, http::header};
use uuid::Uuid;

use crate::{db::entities::user, error::AppError, services::ServiceContext, state::AppState};

/// The authenticated caller, loaded from the bearer token's subject.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>().cloned() {
            return Ok(user);
        }

        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        let token = auth
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

        let services = ServiceContext::from_state(state.as_ref());
        let claims = services.tokens().verify_access(token.trim())?;
        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized("Unauthorized"))?;
        let user = services
            .user()
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Unauthorized"))?;

        let user = AuthUser(user);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
