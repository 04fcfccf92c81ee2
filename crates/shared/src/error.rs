use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    EmptyDomain,
    MissingRate,
    LookupUnavailable,
    InvalidInput,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no character class enabled")]
    EmptyDomain,
    #[error("no exchange rate for {currency}")]
    MissingRate { currency: String },
    #[error("rate lookup for {key} unavailable: {reason}")]
    LookupUnavailable { key: String, reason: String },
    #[error("invalid input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },
}

impl PipelineError {
    pub fn invalid_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PipelineError::EmptyDomain => ErrorCode::EmptyDomain,
            PipelineError::MissingRate { .. } => ErrorCode::MissingRate,
            PipelineError::LookupUnavailable { .. } => ErrorCode::LookupUnavailable,
            PipelineError::InvalidInput { .. } => ErrorCode::InvalidInput,
        }
    }

    /// Whether the last good output stays visible after this failure.
    ///
    /// Only a missing rate leaves the previous conversion in place; every other
    /// failure clears the output so nothing inconsistent with the inputs shows.
    pub fn keeps_prior_output(&self) -> bool {
        matches!(self, PipelineError::MissingRate { .. })
    }
}

/// Serializable error report, for surfacing a failure next to the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl From<&PipelineError> for ErrorReport {
    fn from(value: &PipelineError) -> Self {
        Self {
            code: value.code(),
            message: value.to_string(),
        }
    }
}
