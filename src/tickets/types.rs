//! Dispatch outcomes and the aggregate report.

use serde::{Deserialize, Serialize};

use crate::analysis::RemediationItem;

/// A ticket that was created for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    #[serde(rename = "jiraKey")]
    pub key: String,
    #[serde(rename = "jiraUrl")]
    pub url: String,
    #[serde(rename = "actionItem")]
    pub item: RemediationItem,
}

/// Why one item did not produce a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketError {
    #[serde(rename = "actionItem")]
    pub item: RemediationItem,
    pub error: String,
}

/// Result of attempting one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketOutcome {
    Created(TicketRecord),
    Failed(TicketError),
}

impl TicketOutcome {
    pub fn item(&self) -> &RemediationItem {
        match self {
            Self::Created(record) => &record.item,
            Self::Failed(error) => &error.item,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Outcomes of a dispatch, in input order. Created plus failed always
/// equals the number of input items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: Vec<TicketOutcome>,
}

impl DispatchReport {
    pub fn new(outcomes: Vec<TicketOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[TicketOutcome] {
        &self.outcomes
    }

    pub fn created(&self) -> impl Iterator<Item = &TicketRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            TicketOutcome::Created(record) => Some(record),
            TicketOutcome::Failed(_) => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &TicketError> {
        self.outcomes.iter().filter_map(|o| match o {
            TicketOutcome::Failed(error) => Some(error),
            TicketOutcome::Created(_) => None,
        })
    }

    pub fn total_created(&self) -> usize {
        self.created().count()
    }

    pub fn total_errors(&self) -> usize {
        self.errors().count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportSummary<'a> {
    created_tickets: Vec<&'a TicketRecord>,
    errors: Vec<&'a TicketError>,
    total_created: usize,
    total_errors: usize,
}

impl Serialize for DispatchReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let created_tickets: Vec<_> = self.created().collect();
        let errors: Vec<_> = self.errors().collect();
        ReportSummary {
            total_created: created_tickets.len(),
            total_errors: errors.len(),
            created_tickets,
            errors,
        }
        .serialize(serializer)
    }
}
