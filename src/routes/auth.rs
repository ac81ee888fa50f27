use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::{TokenBundle, providers::OAuthProviderId},
    response::ApiResult,
    routes::{Renames, ValidatedJson, WireNames, users::UserView},
    services::{ServiceContext, auth_service::AuthSession, user_service::NewUser},
    state::AppState,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RegisterRequest {
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "\"password\" is required"),
        length(
            min = 6,
            max = 128,
            message = "\"password\" length must be between 6 and 128 characters"
        )
    )]
    pub password: Option<String>,
    #[validate(length(max = 128, message = "\"name\" length must be at most 128 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "\"password\" is required"),
        length(max = 128, message = "\"password\" length must be at most 128 characters")
    )]
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct RefreshRequest {
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
    #[serde(rename = "refreshToken")]
    #[validate(required(message = "\"refreshToken\" is required"))]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordResetRequest {
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "\"email\" is required"),
        email(message = "\"email\" must be a valid email")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "\"password\" is required"),
        length(
            min = 6,
            max = 128,
            message = "\"password\" length must be between 6 and 128 characters"
        )
    )]
    pub password: Option<String>,
    #[serde(rename = "resetToken")]
    #[validate(required(message = "\"resetToken\" is required"))]
    pub reset_token: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct OAuthRequest {
    #[validate(required(message = "\"access_token\" is required"))]
    pub access_token: Option<String>,
}

impl WireNames for RegisterRequest {}

impl WireNames for LoginRequest {}

impl WireNames for RefreshRequest {
    const RENAMED: Renames = &[("refresh_token", "refreshToken")];
}

impl WireNames for PasswordResetRequest {}

impl WireNames for ResetPasswordRequest {
    const RENAMED: Renames = &[("reset_token", "resetToken")];
}

impl WireNames for OAuthRequest {}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub token: TokenBundle,
    pub user: UserView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: TokenBundle,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: UserView::from(&session.user),
            token: session.token,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh))
        .route("/send-password-reset", post(send_password_reset))
        .route("/reset-password", post(reset_password))
        .route("/facebook", post(facebook))
        .route("/google", post(google))
        .with_state(state)
}

// Only for fields already checked by `required`.
fn present(value: Option<String>) -> String {
    value.unwrap_or_default()
}

async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    let session = service
        .register(NewUser {
            email: present(body.email),
            password: present(body.password),
            name: body.name,
            ..Default::default()
        })
        .await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    let session = service
        .login(&present(body.email), &present(body.password))
        .await?;
    Ok(Json(session.into()))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    let token = service
        .refresh(&present(body.email), &present(body.refresh_token))
        .await?;
    Ok(Json(RefreshResponse { token }))
}

async fn send_password_reset(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<Json<&'static str>> {
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    service.send_password_reset(&present(body.email)).await?;
    Ok(Json("success"))
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<Json<&'static str>> {
    let services = ServiceContext::from_state(state.as_ref());
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    service
        .reset_password(
            &present(body.email),
            &present(body.password),
            &present(body.reset_token),
        )
        .await?;
    Ok(Json("Password Updated"))
}

async fn facebook(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<OAuthRequest>,
) -> ApiResult<Json<SessionResponse>> {
    oauth(&state, OAuthProviderId::Facebook, body).await
}

async fn google(
    State(state): State<Arc<AppState>>,
    ValidatedJson(body): ValidatedJson<OAuthRequest>,
) -> ApiResult<Json<SessionResponse>> {
    oauth(&state, OAuthProviderId::Google, body).await
}

async fn oauth(
    state: &AppState,
    provider: OAuthProviderId,
    body: OAuthRequest,
) -> ApiResult<Json<SessionResponse>> {
    let services = ServiceContext::from_state(state);
    let service = services.auth(&state.identity_providers, state.mailer.as_ref());
    let session = service
        .oauth_login(provider, &present(body.access_token))
        .await?;
    Ok(Json(session.into()))
}
