use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    auth::{AuthUser, Policy, Role, authorize},
    db::entities::user,
    response::ApiResult,
    routes::{Renames, ValidatedJson, ValidatedQuery, WireNames},
    services::{
        ServiceContext,
        user_service::{NewUser, UserFilter, UserPatch, parse_user_id},
    },
    state::AppState,
};

pub const DEFAULT_PER_PAGE: u64 = 15;

/// Public shape of a user; the password hash never leaves the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub picture: Option<String>,
    pub role: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<&user::Model> for UserView {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            email: model.email.clone(),
            picture: model.picture.clone(),
            role: model.role.clone(),
            created_at: model.created_at,
        }
    }
}

fn valid_role(role: &str) -> Result<(), ValidationError> {
    Role::try_from(role).map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("role");
        error.message = Some("\"role\" must be one of [user, admin]".into());
        error
    })
}

fn parse_role(role: Option<String>) -> Option<Role> {
    role.as_deref().and_then(|role| Role::try_from(role).ok())
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ListUsersQuery {
    #[validate(range(min = 1, message = "\"page\" must be larger than or equal to 1"))]
    pub page: Option<u64>,
    #[serde(rename = "perPage")]
    #[validate(range(
        min = 1,
        max = 100,
        message = "\"perPage\" must be between 1 and 100"
    ))]
    pub per_page: Option<u64>,
    pub name: Option<String>,
    pub email: Option<String>,
    #[validate(custom(function = "valid_role"))]
    pub role: Option<String>,
}

impl WireNames for ListUsersQuery {
    const RENAMED: Renames = &[("per_page", "perPage")];
}

/// Body of `POST /users` and `PUT /users/{userId}`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserBody {
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
    #[validate(custom(function = "valid_role"))]
    pub role: Option<String>,
    pub picture: Option<String>,
}

impl WireNames for UserBody {}

impl From<UserBody> for NewUser {
    fn from(body: UserBody) -> Self {
        Self {
            email: body.email.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
            name: body.name,
            role: parse_role(body.role),
            picture: body.picture,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct UserPatchBody {
    #[validate(email(message = "\"email\" must be a valid email"))]
    pub email: Option<String>,
    #[validate(length(
        min = 6,
        max = 128,
        message = "\"password\" length must be between 6 and 128 characters"
    ))]
    pub password: Option<String>,
    #[validate(length(max = 128, message = "\"name\" length must be at most 128 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "valid_role"))]
    pub role: Option<String>,
    pub picture: Option<String>,
}

impl WireNames for UserPatchBody {}

impl From<UserPatchBody> for UserPatch {
    fn from(body: UserPatchBody) -> Self {
        Self {
            email: body.email,
            password: body.password,
            name: body.name,
            role: parse_role(body.role),
            picture: body.picture,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/profile", get(profile))
        .route(
            "/{user_id}",
            get(fetch).put(replace).patch(update).delete(remove),
        )
        .with_state(state)
}

fn actor_role(caller: &user::Model) -> Role {
    Role::try_from(caller.role.as_str()).unwrap_or_default()
}

/// Resolves `{user_id}` for a caller allowed to act on it.
async fn load_subject(
    services: &ServiceContext,
    caller: &user::Model,
    raw_id: &str,
) -> ApiResult<user::Model> {
    let id = parse_user_id(raw_id)?;
    authorize(&Policy::SelfOrAdmin(id), caller)?;
    services.user().load(&id).await
}

async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    ValidatedQuery(query): ValidatedQuery<ListUsersQuery>,
) -> ApiResult<Json<Vec<UserView>>> {
    authorize(&Policy::AdminOnly, &caller)?;

    let services = ServiceContext::from_state(state.as_ref());
    let users = services
        .user()
        .list(
            query.page,
            Some(query.per_page.unwrap_or(DEFAULT_PER_PAGE)),
            UserFilter {
                name: query.name,
                email: query.email,
                role: parse_role(query.role),
            },
        )
        .await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

async fn create(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    ValidatedJson(body): ValidatedJson<UserBody>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    authorize(&Policy::AdminOnly, &caller)?;

    let services = ServiceContext::from_state(state.as_ref());
    let created = services.user().create(body.into()).await?;
    Ok((StatusCode::CREATED, Json(UserView::from(&created))))
}

async fn profile(AuthUser(caller): AuthUser) -> ApiResult<Json<UserView>> {
    authorize(&Policy::AnyOf(vec![Role::User, Role::Admin]), &caller)?;
    Ok(Json(UserView::from(&caller)))
}

async fn fetch(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserView>> {
    let services = ServiceContext::from_state(state.as_ref());
    let subject = load_subject(&services, &caller, &user_id).await?;
    Ok(Json(UserView::from(&subject)))
}

async fn replace(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UserBody>,
) -> ApiResult<Json<UserView>> {
    let services = ServiceContext::from_state(state.as_ref());
    let subject = load_subject(&services, &caller, &user_id).await?;
    let replaced = services
        .user()
        .replace(&subject, body.into(), actor_role(&caller))
        .await?;
    Ok(Json(UserView::from(&replaced)))
}

async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UserPatchBody>,
) -> ApiResult<Json<UserView>> {
    let services = ServiceContext::from_state(state.as_ref());
    let subject = load_subject(&services, &caller, &user_id).await?;
    let updated = services
        .user()
        .update(&subject, body.into(), actor_role(&caller))
        .await?;
    Ok(Json(UserView::from(&updated)))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    AuthUser(caller): AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let services = ServiceContext::from_state(state.as_ref());
    let subject = load_subject(&services, &caller, &user_id).await?;
    services.user().remove(&subject.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;
    use validator::Validate;

    use crate::db::entities::user;

    use super::{ListUsersQuery, UserBody, UserView};

    #[test]
    fn user_view_omits_password_hash() {
        let now = Utc::now().fixed_offset();
        let model = user::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: Some("Alice".to_string()),
            role: "user".to_string(),
            picture: None,
            facebook_id: Some("fb-1".to_string()),
            google_id: None,
        };

        let json = serde_json::to_value(UserView::from(&model)).expect("view should serialize");
        let keys: Vec<&str> = json
            .as_object()
            .expect("view should be an object")
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys.len(), 6);
        for key in ["id", "name", "email", "picture", "role", "createdAt"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let body = UserBody {
            email: Some("alice@example.com".to_string()),
            password: Some("secret1".to_string()),
            role: Some("root".to_string()),
            ..Default::default()
        };

        let errors = body.validate().expect_err("role should be rejected");
        assert!(errors.field_errors().contains_key("role"));
    }

    #[test]
    fn per_page_is_capped() {
        let query = ListUsersQuery {
            per_page: Some(101),
            ..Default::default()
        };
        assert!(query.validate().is_err());

        let query = ListUsersQuery {
            per_page: Some(100),
            ..Default::default()
        };
        assert!(query.validate().is_ok());
    }
}
