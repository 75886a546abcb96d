//! Jira issue payloads built from remediation items.

use std::collections::HashSet;

use serde::Serialize;

use crate::analysis::{Priority, RemediationItem};

/// Jira rejects summaries longer than this.
const MAX_SUMMARY_CHARS: usize = 255;

/// Project-level settings applied to every issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketTemplate {
    pub project_key: String,
    pub issue_type: String,
    /// Added to every issue before the derived labels.
    pub labels: Vec<String>,
}

/// Body of `POST /rest/api/3/issue`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuePayload {
    pub fields: IssueFields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueFields {
    pub project: ProjectRef,
    pub issuetype: NamedRef,
    pub summary: String,
    pub description: AdfDocument,
    pub priority: NamedRef,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedRef {
    pub name: String,
}

/// Atlassian Document Format root node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfDocument {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub version: u8,
    pub content: Vec<AdfNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfNode {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub content: Vec<AdfText>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfText {
    #[serde(rename = "type")]
    pub node_type: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<AdfMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdfMark {
    #[serde(rename = "type")]
    pub mark_type: &'static str,
}

impl AdfText {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            node_type: "text",
            text: text.into(),
            marks: Vec::new(),
        }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self {
            node_type: "text",
            text: text.into(),
            marks: vec![AdfMark { mark_type: "strong" }],
        }
    }
}

impl AdfNode {
    fn paragraph(content: Vec<AdfText>) -> Self {
        Self {
            node_type: "paragraph",
            content,
        }
    }

    fn field(label: &str, value: &str) -> Self {
        Self::paragraph(vec![
            AdfText::strong(format!("{}: ", label)),
            AdfText::plain(value),
        ])
    }
}

/// Jira priority name for an item priority.
pub fn jira_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "High",
        Priority::Medium => "Medium",
        Priority::Low => "Low",
    }
}

/// Turn a control identifier into a Jira label: lowercase, non-alphanumeric
/// runs collapsed to `-`, no leading or trailing dashes.
pub fn sanitize_label(raw: &str) -> String {
    let mut label = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() {
            label.extend(c.to_lowercase());
        } else if !label.ends_with('-') && !label.is_empty() {
            label.push('-');
        }
    }
    label.trim_end_matches('-').to_string()
}

fn build_labels(template: &TicketTemplate, item: &RemediationItem) -> Vec<String> {
    let mut seen = HashSet::new();
    template
        .labels
        .iter()
        .map(|l| sanitize_label(l))
        .chain(std::iter::once(format!(
            "priority-{}",
            item.priority.as_str().to_lowercase()
        )))
        .chain(item.controls.iter().map(|c| sanitize_label(c)))
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}

fn build_summary(item: &RemediationItem) -> String {
    let title = item.title.trim();
    let summary = if title.is_empty() {
        format!("Remediation item {}", item.id.trim())
    } else {
        title.to_string()
    };
    summary.chars().take(MAX_SUMMARY_CHARS).collect()
}

fn build_description(item: &RemediationItem) -> AdfDocument {
    let mut content = Vec::new();
    if !item.description.trim().is_empty() {
        content.push(AdfNode::paragraph(vec![AdfText::plain(item.description.trim())]));
    }
    content.push(AdfNode::field("Priority", item.priority.as_str()));
    content.push(AdfNode::field("Effort", item.effort.as_str()));
    if !item.timeline.trim().is_empty() {
        content.push(AdfNode::field("Timeline", item.timeline.trim()));
    }
    if !item.controls.is_empty() {
        content.push(AdfNode::field("Controls", &item.controls.join(", ")));
    }

    AdfDocument {
        node_type: "doc",
        version: 1,
        content,
    }
}

impl IssuePayload {
    /// Build the issue for one item. Fails only when the item has neither a
    /// title nor an id to derive a summary from.
    pub fn from_item(item: &RemediationItem, template: &TicketTemplate) -> Result<Self, String> {
        if item.title.trim().is_empty() && item.id.trim().is_empty() {
            return Err("Action item has no title or id".to_string());
        }

        Ok(Self {
            fields: IssueFields {
                project: ProjectRef {
                    key: template.project_key.clone(),
                },
                issuetype: NamedRef {
                    name: template.issue_type.clone(),
                },
                summary: build_summary(item),
                description: build_description(item),
                priority: NamedRef {
                    name: jira_priority(item.priority).to_string(),
                },
                labels: build_labels(template, item),
            },
        })
    }
}
