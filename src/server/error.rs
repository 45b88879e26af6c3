//! Mapping of library errors onto HTTP responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::RagError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable error kind, see [`RagError::kind`].
    pub error: &'static str,
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError(pub RagError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self(RagError::Validation(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            RagError::Configuration(_) | RagError::Validation(_) => StatusCode::BAD_REQUEST,
            RagError::DimensionMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RagError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RagError::Embedding(_) | RagError::Generation(_) => StatusCode::BAD_GATEWAY,
            RagError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::validation(format!("invalid multipart body: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(target: "server", "{status}: {}", self.0);
        } else {
            tracing::debug!(target: "server", "{status}: {}", self.0);
        }

        let body = ErrorBody {
            error: self.0.kind(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (RagError::Configuration("x".into()), StatusCode::BAD_REQUEST),
            (RagError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                RagError::DimensionMismatch {
                    expected: 1,
                    actual: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                RagError::ModelUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (RagError::Embedding("x".into()), StatusCode::BAD_GATEWAY),
            (RagError::Generation("x".into()), StatusCode::BAD_GATEWAY),
            (
                RagError::Storage(StorageError::Io(std::io::Error::other("x"))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
