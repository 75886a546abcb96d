//! Remediation ticketing.

mod dispatch;
mod error;
mod jira;
mod payload;
mod types;

pub use dispatch::{item_from_value, RemediationDispatcher};
pub use error::{DispatchError, DispatchErrorKind, TicketServiceError};
pub use jira::{CreatedIssue, JiraClient, JiraConfig, JiraCredentials, TicketService};
pub use payload::{jira_priority, sanitize_label, IssuePayload, TicketTemplate};
pub use types::{DispatchReport, TicketError, TicketOutcome, TicketRecord};
