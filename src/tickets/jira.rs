//! Jira Cloud ticketing service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::TicketServiceError;
use super::payload::{IssuePayload, TicketTemplate};
use crate::http_client::{HttpClient, HttpError, RequestAuth};

/// A newly created issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// External ticketing service.
#[async_trait]
pub trait TicketService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue, TicketServiceError>;

    /// Browser URL for an issue key.
    fn browse_url(&self, key: &str) -> String;
}

/// Jira connection and issue settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraConfig {
    /// Site URL, e.g. https://acme.atlassian.net
    #[serde(default)]
    pub base_url: Option<String>,
    /// Account email for basic auth
    #[serde(default)]
    pub email: Option<String>,
    /// API token (usually supplied via JIRA_API_TOKEN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Project receiving the issues
    #[serde(default)]
    pub project_key: Option<String>,
    /// Issue type name
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    /// Labels added to every issue
    #[serde(default = "default_labels")]
    pub labels: Vec<String>,
    /// Maximum issues created at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_labels() -> Vec<String> {
    vec!["policy-compass".to_string(), "remediation".to_string()]
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

/// Everything needed to talk to Jira, all present.
#[derive(Clone)]
pub struct JiraCredentials {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
}

impl std::fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl JiraConfig {
    fn base_default() -> Self {
        Self {
            base_url: None,
            email: None,
            api_token: None,
            project_key: None,
            issue_type: default_issue_type(),
            labels: default_labels(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `JIRA_BASE_URL`: Site URL
    /// - `JIRA_EMAIL`: Account email
    /// - `JIRA_API_TOKEN`: API token
    /// - `JIRA_PROJECT_KEY`: Project key
    /// - `JIRA_ISSUE_TYPE`: Issue type name
    pub fn with_env_overrides(mut self) -> Self {
        let vars: [(&str, &mut Option<String>); 4] = [
            ("JIRA_BASE_URL", &mut self.base_url),
            ("JIRA_EMAIL", &mut self.email),
            ("JIRA_API_TOKEN", &mut self.api_token),
            ("JIRA_PROJECT_KEY", &mut self.project_key),
        ];
        for (name, slot) in vars {
            if let Ok(val) = std::env::var(name) {
                if !val.trim().is_empty() {
                    *slot = Some(val);
                }
            }
        }
        if let Ok(val) = std::env::var("JIRA_ISSUE_TYPE") {
            if !val.trim().is_empty() {
                self.issue_type = val;
            }
        }
        self
    }

    /// Credentials, or the names of the missing settings.
    pub fn credentials(&self) -> Result<JiraCredentials, Vec<&'static str>> {
        let base_url = non_blank(&self.base_url);
        let email = non_blank(&self.email);
        let api_token = non_blank(&self.api_token);

        match (base_url, email, api_token) {
            (Some(base_url), Some(email), Some(api_token)) => Ok(JiraCredentials {
                base_url: base_url.trim_end_matches('/').to_string(),
                email,
                api_token,
            }),
            (base_url, email, api_token) => {
                let mut missing = Vec::new();
                if base_url.is_none() {
                    missing.push("JIRA_BASE_URL");
                }
                if email.is_none() {
                    missing.push("JIRA_EMAIL");
                }
                if api_token.is_none() {
                    missing.push("JIRA_API_TOKEN");
                }
                Err(missing)
            }
        }
    }

    /// Issue template, if a project key is configured.
    pub fn template(&self) -> Option<TicketTemplate> {
        non_blank(&self.project_key).map(|project_key| TicketTemplate {
            project_key,
            issue_type: self.issue_type.clone(),
            labels: self.labels.clone(),
        })
    }

    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_token.is_some() {
            copy.api_token = Some("<redacted>".to_string());
        }
        copy
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JiraErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// Pull a readable message out of a Jira error body.
fn error_message(status: u16, body: &str) -> String {
    let parsed: JiraErrorBody = serde_json::from_str(body).unwrap_or_default();
    let mut parts = parsed.error_messages;
    parts.extend(
        parsed
            .errors
            .into_iter()
            .map(|(field, msg)| format!("{}: {}", field, msg)),
    );
    if parts.is_empty() {
        format!("Jira returned HTTP {}", status)
    } else {
        parts.join("; ")
    }
}

/// Jira Cloud REST v3 client.
pub struct JiraClient {
    client: HttpClient,
    credentials: JiraCredentials,
}

impl JiraClient {
    pub fn new(credentials: JiraCredentials, timeout: Duration) -> Result<Self, HttpError> {
        let client = HttpClient::builder("jira", timeout).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    fn auth(&self) -> RequestAuth {
        RequestAuth::Basic {
            username: self.credentials.email.clone(),
            password: self.credentials.api_token.clone(),
        }
    }
}

#[async_trait]
impl TicketService for JiraClient {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue, TicketServiceError> {
        let url = format!("{}/rest/api/3/issue", self.credentials.base_url);
        let response = self
            .client
            .post_json(&url, payload, &self.auth())
            .await
            .map_err(|e| TicketServiceError::Transport(e.to_string()))?;

        let status = response.status.as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TicketServiceError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = error_message(status, &body);
            warn!("Jira rejected issue '{}': {}", payload.fields.summary, message);
            return Err(TicketServiceError::Rejected { status, message });
        }

        let created: CreatedIssue = serde_json::from_str(&body)
            .map_err(|e| TicketServiceError::InvalidResponse(e.to_string()))?;
        debug!("Created Jira issue {}", created.key);
        Ok(created)
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.credentials.base_url, key)
    }
}
