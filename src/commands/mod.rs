mod answers;

pub use answers::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::answers::LedgerError;
use crate::enrichment::EnrichmentError;

const LOOKUP_FAILED_MESSAGE: &str = "Failed to fetch study material. Please try again.";

#[derive(Debug, serde::Serialize)]
pub struct CommandError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl CommandError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            status,
        }
    }
}

impl From<LedgerError> for CommandError {
    fn from(err: LedgerError) -> Self {
        let status = match err {
            LedgerError::EmptyAnswer => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::NotEligible(_) | LedgerError::AlreadyEnriched(_) => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl From<EnrichmentError> for CommandError {
    fn from(err: EnrichmentError) -> Self {
        match err {
            EnrichmentError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            EnrichmentError::NotEligible(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            err if err.is_retryable() => Self {
                message: LOOKUP_FAILED_MESSAGE.to_string(),
                detail: Some(err.to_string()),
                status: StatusCode::BAD_GATEWAY,
            },
            err => Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

type CommandResult<T> = Result<T, CommandError>;
