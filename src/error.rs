use serde::Serialize;

/// One invalid request field, reported with every message that applies to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub location: String,
    pub messages: Vec<String>,
}

impl FieldError {
    pub fn new(
        field: impl Into<String>,
        location: impl Into<String>,
        messages: Vec<String>,
    ) -> Self {
        Self {
            field: field.into(),
            location: location.into(),
            messages,
        }
    }

    pub fn body(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(field, "body", vec![message.into()])
    }
}

pub const VALIDATION_ERROR_MESSAGE: &str = "Validation Error";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation Error")]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Conflict {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Duplicate-email conflict in the same shape as a validation failure.
    pub fn duplicate_email() -> Self {
        Self::Conflict {
            message: VALIDATION_ERROR_MESSAGE.to_string(),
            errors: vec![FieldError::body("email", "\"email\" already exists")],
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Validation(_) => VALIDATION_ERROR_MESSAGE,
            Self::Conflict { message, .. } => message.as_str(),
            Self::BadRequest(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Internal(message) => message.as_str(),
        }
    }

    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) | Self::Conflict { errors, .. } => errors.as_slice(),
            _ => &[],
        }
    }
}

impl From<crate::db::dao::DaoLayerError> for AppError {
    fn from(err: crate::db::dao::DaoLayerError) -> Self {
        use crate::db::dao::DaoLayerError;

        match err {
            DaoLayerError::NotFound { .. } => AppError::not_found(err.to_string()),
            DaoLayerError::InvalidPagination { .. } => AppError::bad_request(err.to_string()),
            DaoLayerError::UniqueViolation(_) => AppError::conflict(err.to_string()),
            DaoLayerError::Db(_) => AppError::internal(err.to_string()),
        }
    }
}
