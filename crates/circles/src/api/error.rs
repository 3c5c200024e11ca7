use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::error::CircleError;

/// Failures surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MissingImage(&'static str),

    #[error("Invalid file type")]
    InvalidFileType,

    #[error("{0}")]
    InvalidImage(String),

    #[error("{0}")]
    InvalidParameter(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("File too large. Maximum size is {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Endpoint not found")]
    NotFound,

    /// Details are logged, never sent to the client
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingImage(_)
            | Self::InvalidFileType
            | Self::InvalidImage(_)
            | Self::InvalidParameter(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map a body-reading failure, keeping the oversize case distinct
    pub fn from_rejection(status: StatusCode, text: String, limit: usize) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(limit)
        } else {
            Self::BadRequest(text)
        }
    }

    pub fn from_multipart(err: MultipartError, limit: usize) -> Self {
        Self::from_rejection(err.status(), err.body_text(), limit)
    }
}

impl From<CircleError> for ApiError {
    fn from(err: CircleError) -> Self {
        match err {
            CircleError::InvalidImage(msg) => Self::InvalidImage(msg),
            CircleError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Internal(details) => tracing::error!(%details, "request failed"),
            other => tracing::debug!(%status, error = %other, "rejected request"),
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_bad_request() {
        let err: ApiError = CircleError::InvalidImage("cannot decode image".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "cannot decode image");

        let err: ApiError = CircleError::InvalidParameter("min_radius".into()).into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err: ApiError = CircleError::Internal("PNG encoding failed: disk on fire".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }

    #[test]
    fn test_oversize_rejection() {
        let err = ApiError::from_rejection(StatusCode::PAYLOAD_TOO_LARGE, "length limit".into(), 1024);
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().contains("1024"));
    }
}
