use std::sync::Arc;

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    response::{ErrorDetail, ErrorEnvelope, default_message},
    state::AppState,
};

const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Gives every error response the JSON envelope shape. Plain-text bodies (framework
/// rejections) are wrapped; in development the diagnostic detail is added as `stack`.
pub async fn error_envelope_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let response = next.run(req).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let expose_detail = state.config.run_mode().exposes_error_detail();
    let is_json = is_json_response(&response);
    if is_json && !expose_detail {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, MAX_ERROR_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => Bytes::new(),
    };

    let mut envelope = if is_json {
        match serde_json::from_slice::<ErrorEnvelope>(&bytes) {
            Ok(envelope) => envelope,
            // Not ours; pass it through untouched.
            Err(_) => return Response::from_parts(parts, Body::from(bytes)),
        }
    } else {
        let envelope = ErrorEnvelope::from_status(status, body_message(status, &bytes));
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                message = %envelope.message,
                "request failed"
            );
        }
        envelope
    };

    if expose_detail {
        envelope.stack = parts
            .extensions
            .get::<ErrorDetail>()
            .map(|detail| detail.0.clone());
    }

    let mut rebuilt = envelope.into_response();
    *rebuilt.status_mut() = status;
    copy_headers(&parts.headers, &mut rebuilt);
    rebuilt
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
        .unwrap_or(false)
}

fn body_message(status: StatusCode, bytes: &Bytes) -> String {
    let message = String::from_utf8_lossy(bytes).trim().to_string();
    if message.is_empty() {
        return default_message(status);
    }
    message
}

fn copy_headers(src: &HeaderMap, dest: &mut Response) {
    for (name, value) in src {
        if name == header::CONTENT_TYPE || name == header::CONTENT_LENGTH {
            continue;
        }
        dest.headers_mut().insert(name.clone(), value.clone());
    }
}
