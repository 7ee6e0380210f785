//! Error types for the build endpoint.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docx_template_core::TemplateError;
use serde::Serialize;

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Missing form field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Unknown output format '{0}' (expected pdf or docx)")]
    UnknownFormat(String),

    #[error("Build failed: {0}")]
    Build(#[from] TemplateError),

    #[error("PDF not found; check conversion step.")]
    PdfUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: String,
            code: &'static str,
        }

        let (status, code) = match &self {
            ServerError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            ServerError::Multipart(_) => (StatusCode::BAD_REQUEST, "INVALID_MULTIPART"),
            ServerError::UnknownFormat(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_FORMAT"),
            ServerError::Build(e) if e.is_invalid_input() => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_TEMPLATE")
            }
            ServerError::Build(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BUILD_FAILED"),
            ServerError::PdfUnavailable => (StatusCode::INTERNAL_SERVER_ERROR, "PDF_UNAVAILABLE"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorBody {
            error: self.to_string(),
            code,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
