//! Ticket dispatch errors.

use serde::Serialize;
use thiserror::Error;

/// Whole-call failures, raised before any item is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("User not authenticated")]
    Unauthenticated,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchErrorKind {
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
}

impl DispatchError {
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            Self::Unauthenticated => DispatchErrorKind::Unauthenticated,
            Self::InvalidArgument(_) => DispatchErrorKind::InvalidArgument,
            Self::FailedPrecondition(_) => DispatchErrorKind::FailedPrecondition,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "Sign in to create tickets.",
            Self::InvalidArgument(_) => "The remediation items could not be read.",
            Self::FailedPrecondition(_) => {
                "Ticketing is not configured. Set the Jira URL, email, API token and project key."
            }
        }
    }
}

/// Per-item failure from the ticketing service.
#[derive(Debug, Error)]
pub enum TicketServiceError {
    /// The service answered with an error status.
    #[error("{message} (HTTP {status})")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}
