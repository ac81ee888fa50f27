mod auth;
mod extract;
mod users;

use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware::from_fn_with_state, routing::get};

use crate::{
    middleware::{catch_panic_layer, error_envelope_middleware},
    response::ErrorEnvelope,
    state::AppState,
};

pub use auth::{RefreshResponse, SessionResponse};
pub use extract::{Renames, ValidatedJson, ValidatedQuery, WireNames, validation_error};
pub use users::UserView;

pub const API_PREFIX: &str = "/v1";

/// Full application router: API routes, the not-found fallback and the error layers.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/status", get(status))
        .nest("/auth", auth::router(state.clone()))
        .nest("/users", users::router(state.clone()));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .layer(catch_panic_layer())
        .layer(from_fn_with_state(state, error_envelope_middleware))
}

async fn status() -> &'static str {
    "OK"
}

async fn not_found() -> ErrorEnvelope {
    ErrorEnvelope::from_status(StatusCode::NOT_FOUND, "Not found")
}
