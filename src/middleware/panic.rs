use std::any::Any;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::response::{ErrorDetail, ErrorEnvelope, default_message};

pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_to_envelope)
}

fn panic_to_envelope(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    };

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let mut response = ErrorEnvelope::from_status(status, default_message(status)).into_response();
    response
        .extensions_mut()
        .insert(ErrorDetail(format!("panic: {details}")));
    response
}
