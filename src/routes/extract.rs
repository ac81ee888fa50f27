use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::{AppError, FieldError};

pub type Renames = &'static [(&'static str, &'static str)];

/// Request fields whose name on the wire differs from the Rust field name, as
/// `(rust_name, wire_name)` pairs. Validation errors report the wire name.
pub trait WireNames {
    const RENAMED: Renames = &[];
}

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + WireNames,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| validation_error(&errors, "body", T::RENAMED))?;
        Ok(Self(value))
    }
}

/// Query string that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate + WireNames,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| validation_error(&errors, "query", T::RENAMED))?;
        Ok(Self(value))
    }
}

/// One entry per invalid field, named as the client sent it and sorted by that name.
pub fn validation_error(
    errors: &ValidationErrors,
    location: &str,
    renamed: &[(&str, &str)],
) -> AppError {
    let mut fields: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let field: &str = &field;
            let field = renamed
                .iter()
                .find(|(rust_name, _)| *rust_name == field)
                .map_or(field, |(_, wire_name)| *wire_name);
            let messages = errors
                .iter()
                .map(|error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("\"{field}\" is invalid ({})", error.code),
                })
                .collect();
            FieldError::new(field.to_string(), location, messages)
        })
        .collect();
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    AppError::validation(fields)
}
