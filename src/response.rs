use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldError};

pub type ApiResult<T> = Result<T, AppError>;

/// Uniform body for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub location: String,
    pub messages: Vec<String>,
}

impl From<&FieldError> for FieldErrorBody {
    fn from(err: &FieldError) -> Self {
        Self {
            field: err.field.clone(),
            location: err.location.clone(),
            messages: err.messages.clone(),
        }
    }
}

/// Diagnostic detail for an error response, attached as a response extension.
/// The error middleware copies it into `stack` when the run mode allows it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl ErrorEnvelope {
    pub fn from_error(err: &AppError) -> Self {
        let status = status_for(err);
        Self {
            code: status.as_u16(),
            message: client_message(err, status),
            errors: err.field_errors().iter().map(FieldErrorBody::from).collect(),
            stack: None,
        }
    }

    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            errors: Vec::new(),
            stack: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        if status.is_server_error() {
            log_app_error(&self, status);
        }

        let mut response = ErrorEnvelope::from_error(&self).into_response();
        response
            .extensions_mut()
            .insert(ErrorDetail(format!("{self:?}")));
        response
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn default_message(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

// Internal detail stays in logs and the development-only stack.
fn client_message(err: &AppError, status: StatusCode) -> String {
    match err {
        AppError::Internal(_) => default_message(status),
        other if other.message().is_empty() => default_message(status),
        other => other.message().to_string(),
    }
}

pub fn log_app_error(err: &AppError, status: StatusCode) {
    tracing::error!(status = status.as_u16(), error = ?err, "request failed");
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::error::AppError;

    use super::{ErrorDetail, ErrorEnvelope};

    #[test]
    fn internal_errors_hide_their_detail() {
        let envelope = ErrorEnvelope::from_error(&AppError::internal("db exploded"));

        assert_eq!(envelope.code, 500);
        assert_eq!(envelope.message, "Internal Server Error");
        assert!(envelope.stack.is_none());
    }

    #[test]
    fn conflict_envelope_lists_field_errors() {
        let envelope = ErrorEnvelope::from_error(&AppError::duplicate_email());
        let json = serde_json::to_value(&envelope).expect("envelope should serialize");

        assert_eq!(json["code"], 409);
        assert_eq!(json["message"], "Validation Error");
        assert_eq!(json["errors"][0]["field"], "email");
        assert_eq!(json["errors"][0]["location"], "body");
        assert_eq!(json["errors"][0]["messages"][0], "\"email\" already exists");
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn plain_errors_omit_errors_array() {
        let json = serde_json::to_value(ErrorEnvelope::from_error(&AppError::unauthorized(
            "Incorrect email or password",
        )))
        .expect("envelope should serialize");

        assert_eq!(json["code"], 401);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn app_error_response_carries_detail_extension() {
        let response = AppError::forbidden("Forbidden").into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let detail = response
            .extensions()
            .get::<ErrorDetail>()
            .expect("detail extension should be attached");
        assert!(detail.0.contains("Forbidden"));
    }
}
