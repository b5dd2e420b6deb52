//! Enrichment error types

use thiserror::Error;

use crate::answers::AnswerId;

/// Errors that can occur while revealing study material.
///
/// `Clone` so one lookup outcome can be handed to every caller that joined it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Answer not found: {0}")]
    NotFound(AnswerId),

    #[error("Answer {0} is a correct answer and has no study material")]
    NotEligible(AnswerId),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EnrichmentError {
    /// Lookup failures may succeed on a later reveal; everything else won't
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport(_) | Self::InvalidResponse(_))
    }
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type alias for enrichment operations
pub type EnrichmentResult<T> = Result<T, EnrichmentError>;
