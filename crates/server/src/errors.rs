use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::error;

/// JSON error response: `{"error": <title>, "message": <detail>}`.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: Option<String>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, error: &'static str, message: Option<String>) -> Self {
        Self { status, error, message }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthenticated", Some(message.into()))
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(e: ServiceError) -> Self {
        let msg = Some(e.to_string());
        match e {
            ServiceError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, "Validation Error", msg),
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "Not Found", msg),
            ServiceError::Unauthorized(_) => Self::new(StatusCode::FORBIDDEN, "Forbidden", msg),
            ServiceError::Conflict(_) => Self::new(StatusCode::CONFLICT, "Conflict", msg),
            ServiceError::Storage(_) => {
                error!(code = e.code(), err = %e, "ticket storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", msg)
            }
        }
    }
}

impl From<JsonRejection> for JsonApiError {
    fn from(e: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Validation Error", Some(e.body_text()))
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { error: self.error.to_string(), message: self.message };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (ServiceError::validation("x"), StatusCode::BAD_REQUEST),
            (ServiceError::not_found("ticket"), StatusCode::NOT_FOUND),
            (ServiceError::unauthorized("x"), StatusCode::FORBIDDEN),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT),
            (ServiceError::storage("disk full"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(JsonApiError::from(err).status, status);
        }
    }
}
