//! Analysis error taxonomy.

use serde::Serialize;
use thiserror::Error;

use super::request::RequestError;

/// The reportable failure kinds, one per distinct user-facing condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisErrorKind {
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    ResourceExhausted,
    SafetyRejected,
    MalformedResponse,
    Internal,
}

impl AnalysisErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid-argument",
            Self::FailedPrecondition => "failed-precondition",
            Self::ResourceExhausted => "resource-exhausted",
            Self::SafetyRejected => "safety-rejected",
            Self::MalformedResponse => "malformed-response",
            Self::Internal => "internal",
        }
    }
}

impl std::fmt::Display for AnalysisErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Rejected by content policy: {0}")]
    SafetyRejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            Self::Unauthenticated(_) => AnalysisErrorKind::Unauthenticated,
            Self::InvalidArgument(_) => AnalysisErrorKind::InvalidArgument,
            Self::FailedPrecondition(_) => AnalysisErrorKind::FailedPrecondition,
            Self::ResourceExhausted(_) => AnalysisErrorKind::ResourceExhausted,
            Self::SafetyRejected(_) => AnalysisErrorKind::SafetyRejected,
            Self::MalformedResponse(_) => AnalysisErrorKind::MalformedResponse,
            Self::Internal(_) => AnalysisErrorKind::Internal,
        }
    }

    /// Actionable message for the person who requested the analysis.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            AnalysisErrorKind::Unauthenticated => "Sign in to analyze documents.",
            AnalysisErrorKind::InvalidArgument => {
                "There is no document text to analyze. Upload a PDF that contains selectable text."
            }
            AnalysisErrorKind::FailedPrecondition => {
                "The analysis service is not configured correctly. Check the engine API key and model."
            }
            AnalysisErrorKind::ResourceExhausted => {
                "The analysis quota has been used up. Wait a few minutes and try again."
            }
            AnalysisErrorKind::SafetyRejected => {
                "The analysis service declined to process this document under its content policy."
            }
            AnalysisErrorKind::MalformedResponse => {
                "The analysis service returned an empty or unreadable response. Try again."
            }
            AnalysisErrorKind::Internal => "The analysis failed unexpectedly. Try again later.",
        }
    }
}

impl From<RequestError> for AnalysisError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Unauthenticated => Self::Unauthenticated(err.to_string()),
            RequestError::EmptyInput => Self::InvalidArgument(err.to_string()),
        }
    }
}
