//! Maps failures onto HTTP responses with a `{"error": ...}` body.

use crate::core::CoreError;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to parse form data: {0}")]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => core_status(err),
            ApiError::Multipart(err) => err.status(),
        }
    }
}

fn core_status(err: &CoreError) -> StatusCode {
    match err {
        CoreError::PathOutsideRoot(_) => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                CoreError::InvalidPath("%zz".into(), "bad escape".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::PathOutsideRoot("../..".into()),
                StatusCode::FORBIDDEN,
            ),
            (CoreError::MissingQuery, StatusCode::BAD_REQUEST),
            (
                CoreError::InvalidSortField("owner".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::NotFound(PathBuf::from("/x")),
                StatusCode::NOT_FOUND,
            ),
            (
                CoreError::NotAVideo(PathBuf::from("/x.txt")),
                StatusCode::BAD_REQUEST,
            ),
            (
                CoreError::Traversal(io::Error::other("denied"), PathBuf::from("/x")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                CoreError::ThumbnailGeneration(PathBuf::from("/x.mp4"), "exit 1".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_response_status_follows_error() {
        let response = ApiError::from(CoreError::MissingField("user")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
