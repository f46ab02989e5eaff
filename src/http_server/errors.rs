//! # API Errors
//!
//! Maps schema and store failures onto HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP API errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Payload failed validation; every failing field is listed
    #[error("{message}")]
    Validation { message: String, details: Vec<String> },

    /// Malformed query parameter
    #[error("Invalid query parameter: {0}")]
    InvalidQueryParam(String),

    /// Survey id unknown
    #[error("Survey not found")]
    SurveyNotFound,

    /// No config registered for the study
    #[error("Study config not found: {0}")]
    StudyConfigNotFound(String),

    /// Study settings forbid this submission
    #[error("{0}")]
    Conflict(String),

    // ==================
    // Server Errors (5xx)
    // ==================
    /// Storage failure; details stay in the log
    #[error("Database error")]
    Database,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::InvalidQueryParam(_) => StatusCode::BAD_REQUEST,

            ApiError::SurveyNotFound => StatusCode::NOT_FOUND,
            ApiError::StudyConfigNotFound(_) => StatusCode::NOT_FOUND,

            ApiError::Conflict(_) => StatusCode::CONFLICT,

            ApiError::Database => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Single-detail validation failure
    pub fn invalid_body(detail: impl Into<String>) -> Self {
        ApiError::Validation {
            message: "Invalid request body".to_string(),
            details: vec![detail.into()],
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        ApiError::Validation {
            message: err.message().to_string(),
            details: err.details().iter().map(ToString::to_string).collect(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SurveyNotFound(_) => ApiError::SurveyNotFound,
            StoreError::ResubmissionRejected { .. } => ApiError::Conflict(err.to_string()),
            other => {
                error!(error = %other, "storage operation failed");
                ApiError::Database
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_body(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQueryParam(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        let code = err.status_code().as_u16();
        let error = err.to_string();
        let details = match err {
            ApiError::Validation { details, .. } => details,
            _ => Vec::new(),
        };
        Self { error, code, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
