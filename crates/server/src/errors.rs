use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use common::types::Detail;
use models::errors::FieldErrors;
use service::errors::ServiceError;

use crate::templates::Templates;

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const INVALID_TOKEN: &str = "Invalid or expired token.";
pub const NOT_FOUND: &str = "Not found.";

/// JSON error response: either `{"detail": ...}` or a field map for validation failures.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl JsonApiError {
    pub fn new(status: StatusCode, title: &str, message: Option<String>) -> Self {
        let body = match message {
            Some(m) => serde_json::json!({"detail": title, "message": m}),
            None => serde_json::json!(Detail::new(title)),
        };
        Self { status, body }
    }

    pub fn detail(status: StatusCode, detail: &str) -> Self { Self::new(status, detail, None) }

    pub fn fields(errs: FieldErrors) -> Self {
        Self { status: StatusCode::BAD_REQUEST, body: serde_json::json!(errs) }
    }

    pub fn not_found() -> Self { Self::detail(StatusCode::NOT_FOUND, NOT_FOUND) }

    pub fn unauthorized(detail: &str) -> Self { Self::detail(StatusCode::UNAUTHORIZED, detail) }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        error!(error = %e, "internal error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", None)
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Invalid(f) => JsonApiError::fields(f),
            ServiceError::Validation(msg) => JsonApiError::new(StatusCode::BAD_REQUEST, "Validation Error", Some(msg)),
            ServiceError::NotFound(_) => JsonApiError::not_found(),
            other => JsonApiError::internal(other),
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let mut resp = (self.status, Json(self.body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            resp.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        resp
    }
}

/// Error page for the server-rendered views.
#[derive(Debug)]
pub struct PageError {
    pub status: StatusCode,
    pub body: String,
}

impl PageError {
    pub fn render(templates: &Templates, status: StatusCode, message: &str) -> Self {
        let ctx = serde_json::json!({"status": status.as_u16(), "message": message});
        let body = templates.render("error.html", ctx).unwrap_or_else(|e| {
            error!(error = %e, "error page template failed");
            format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("Error"))
        });
        Self { status, body }
    }

    pub fn not_found(templates: &Templates, message: &str) -> Self {
        Self::render(templates, StatusCode::NOT_FOUND, message)
    }

    pub fn internal(templates: &Templates, e: impl std::fmt::Display) -> Self {
        error!(error = %e, "page handler failed");
        Self::render(templates, StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (self.status, Html(self.body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("template compilation failed: {0}")]
    Templates(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}
