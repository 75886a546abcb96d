//! Remediation dispatch: one ticket per item, failures isolated per item.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{info, warn};

use super::error::DispatchError;
use super::jira::{JiraClient, JiraConfig, TicketService};
use super::payload::{IssuePayload, TicketTemplate};
use super::types::{DispatchReport, TicketError, TicketOutcome, TicketRecord};
use crate::analysis::{split_controls, Effort, Priority, RemediationItem};
use crate::auth::Identity;

/// Read one element of an untyped item list. Missing fields are filled in
/// (id `item-N`, priority and effort Medium); a non-object is an error
/// carrying a placeholder item.
pub fn item_from_value(index: usize, value: &Value) -> Result<RemediationItem, TicketError> {
    let fallback_id = format!("item-{}", index + 1);
    let Some(obj) = value.as_object() else {
        return Err(TicketError {
            item: RemediationItem {
                id: fallback_id,
                title: String::new(),
                description: String::new(),
                priority: Priority::default(),
                effort: Effort::default(),
                timeline: String::new(),
                controls: Vec::new(),
            },
            error: "Action item must be a JSON object".to_string(),
        });
    };

    let text = |key: &str| -> String {
        obj.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback_id,
    };

    let controls = match obj.get("controls") {
        Some(Value::Array(entries)) => {
            let entries: Vec<&str> = entries.iter().filter_map(Value::as_str).collect();
            split_controls(&entries)
        }
        Some(Value::String(s)) => split_controls(&[s.as_str()]),
        _ => Vec::new(),
    };

    Ok(RemediationItem {
        id,
        title: text("title"),
        description: text("description"),
        priority: Priority::from_label(obj.get("priority").and_then(Value::as_str)),
        effort: Effort::from_label(obj.get("effort").and_then(Value::as_str)),
        timeline: text("timeline"),
        controls,
    })
}

/// Creates tickets for remediation items.
#[derive(Clone)]
pub struct RemediationDispatcher {
    service: Option<Arc<dyn TicketService>>,
    template: Option<TicketTemplate>,
    concurrency: usize,
    unavailable_reason: String,
}

impl RemediationDispatcher {
    pub fn new(service: Arc<dyn TicketService>, template: TicketTemplate) -> Self {
        Self {
            service: Some(service),
            template: Some(template),
            concurrency: 1,
            unavailable_reason: String::new(),
        }
    }

    /// Build from config. Missing credentials don't fail here; every
    /// dispatch then fails with `FailedPrecondition`.
    pub fn from_config(config: &JiraConfig) -> Self {
        let concurrency = config.concurrency.max(1);
        let template = config.template();

        let (service, unavailable_reason) = match config.credentials() {
            Ok(credentials) => {
                match JiraClient::new(credentials, Duration::from_secs(config.timeout_secs)) {
                    Ok(client) => (Some(Arc::new(client) as Arc<dyn TicketService>), String::new()),
                    Err(e) => (None, format!("Jira client unavailable: {}", e)),
                }
            }
            Err(missing) => (None, format!("missing {}", missing.join(", "))),
        };
        let unavailable_reason = if template.is_none() && unavailable_reason.is_empty() {
            "missing JIRA_PROJECT_KEY".to_string()
        } else {
            unavailable_reason
        };

        Self {
            service,
            template,
            concurrency,
            unavailable_reason,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Whether tickets can be created at all.
    pub fn is_configured(&self) -> bool {
        self.service.is_some() && self.template.is_some()
    }

    fn ready(&self) -> Result<(Arc<dyn TicketService>, &TicketTemplate), DispatchError> {
        match (&self.service, &self.template) {
            (Some(service), Some(template)) => Ok((service.clone(), template)),
            _ => Err(DispatchError::FailedPrecondition(format!(
                "ticketing credentials unavailable ({})",
                self.unavailable_reason
            ))),
        }
    }

    /// Create one ticket per item. The report lists outcomes in input
    /// order; one item failing never affects another.
    pub async fn dispatch(
        &self,
        identity: Option<&Identity>,
        items: &[RemediationItem],
    ) -> Result<DispatchReport, DispatchError> {
        identity.ok_or(DispatchError::Unauthenticated)?;
        let prepared: Vec<_> = items.iter().cloned().map(Ok).collect();
        self.run(prepared).await
    }

    /// Like [`dispatch`](Self::dispatch) for an untyped JSON list, as
    /// stored in a saved analysis. Anything but an array is rejected
    /// before any item is attempted.
    pub async fn dispatch_json(
        &self,
        identity: Option<&Identity>,
        items: &Value,
    ) -> Result<DispatchReport, DispatchError> {
        identity.ok_or(DispatchError::Unauthenticated)?;
        let entries = items.as_array().ok_or_else(|| {
            DispatchError::InvalidArgument("action items must be a list".to_string())
        })?;
        let prepared: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(index, value)| item_from_value(index, value))
            .collect();
        self.run(prepared).await
    }

    async fn run(
        &self,
        prepared: Vec<Result<RemediationItem, TicketError>>,
    ) -> Result<DispatchReport, DispatchError> {
        let (service, template) = self.ready()?;
        if prepared.is_empty() {
            return Ok(DispatchReport::default());
        }

        info!(
            "Creating {} ticket(s) via {} (concurrency {})",
            prepared.len(),
            service.name(),
            self.concurrency
        );

        let mut indexed: Vec<(usize, TicketOutcome)> = stream::iter(prepared.into_iter().enumerate())
            .map(|(index, entry)| {
                let service = service.clone();
                async move {
                    let outcome = match entry {
                        Ok(item) => create_one(service.as_ref(), template, item).await,
                        Err(error) => TicketOutcome::Failed(error),
                    };
                    (index, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);

        let report = DispatchReport::new(indexed.into_iter().map(|(_, o)| o).collect());
        info!(
            "Ticket dispatch finished: {} created, {} failed",
            report.total_created(),
            report.total_errors()
        );
        Ok(report)
    }
}

async fn create_one(
    service: &dyn TicketService,
    template: &TicketTemplate,
    item: RemediationItem,
) -> TicketOutcome {
    let payload = match IssuePayload::from_item(&item, template) {
        Ok(payload) => payload,
        Err(error) => return TicketOutcome::Failed(TicketError { item, error }),
    };

    match service.create_issue(&payload).await {
        Ok(created) => TicketOutcome::Created(TicketRecord {
            url: service.browse_url(&created.key),
            key: created.key,
            item,
        }),
        Err(e) => {
            warn!("Ticket for item {} failed: {}", item.id, e);
            TicketOutcome::Failed(TicketError {
                item,
                error: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tickets::error::{DispatchErrorKind, TicketServiceError};
    use crate::tickets::jira::CreatedIssue;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails any issue whose summary contains "fail" (rejected) or
    /// "offline" (transport); otherwise numbers issues in creation order.
    struct FakeService {
        created: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FakeService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                created: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TicketService for FakeService {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn create_issue(
            &self,
            payload: &IssuePayload,
        ) -> Result<CreatedIssue, TicketServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if payload.fields.summary.contains("fail") {
                return Err(TicketServiceError::Rejected {
                    status: 400,
                    message: "priority: Priority is invalid".into(),
                });
            }
            if payload.fields.summary.contains("offline") {
                return Err(TicketServiceError::Transport(
                    "error sending request: connection refused".into(),
                ));
            }
            let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(CreatedIssue {
                key: format!("SEC-{}", n),
                id: None,
            })
        }

        fn browse_url(&self, key: &str) -> String {
            format!("https://jira.test/browse/{}", key)
        }
    }

    fn template() -> TicketTemplate {
        TicketTemplate {
            project_key: "SEC".into(),
            issue_type: "Task".into(),
            labels: vec![],
        }
    }

    fn item(id: &str, title: &str) -> RemediationItem {
        RemediationItem {
            id: id.into(),
            title: title.into(),
            description: "desc".into(),
            priority: Priority::Medium,
            effort: Effort::Medium,
            timeline: "30 days".into(),
            controls: vec![],
        }
    }

    fn alice() -> Identity {
        Identity::new("alice", "token").unwrap()
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_order_kept() {
        let service = FakeService::new();
        let dispatcher = RemediationDispatcher::new(service.clone(), template()).with_concurrency(3);
        let items = vec![
            item("1", "Enable MFA"),
            item("2", "This one will fail"),
            item("3", "Encrypt backups"),
        ];

        let report = dispatcher.dispatch(Some(&alice()), &items).await.unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.total_created(), 2);
        assert_eq!(report.total_errors(), 1);
        let ids: Vec<&str> = report.outcomes().iter().map(|o| o.item().id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert!(!report.outcomes()[1].is_created());
        assert_eq!(service.calls.load(Ordering::SeqCst), 3);

        let error = report.errors().next().unwrap();
        assert!(error.error.contains("Priority is invalid"));
        let record = report.created().next().unwrap();
        assert!(record.url.starts_with("https://jira.test/browse/SEC-"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_isolated() {
        let service = FakeService::new();
        let dispatcher = RemediationDispatcher::new(service.clone(), template()).with_concurrency(2);
        let items = vec![
            item("1", "Enable MFA"),
            item("2", "Encrypt backups"),
            item("3", "Tracker offline here"),
            item("4", "Review access"),
        ];

        let report = dispatcher.dispatch(Some(&alice()), &items).await.unwrap();

        assert_eq!(report.len(), 4);
        assert_eq!(report.total_created(), 3);
        let created: Vec<&str> = report.created().map(|r| r.item.id.as_str()).collect();
        assert_eq!(created, vec!["1", "2", "4"]);

        assert!(!report.outcomes()[2].is_created());
        let error = report.errors().next().unwrap();
        assert_eq!(error.item.id, "3");
        assert!(error.error.contains("connection refused"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_list_makes_no_calls() {
        let service = FakeService::new();
        let dispatcher = RemediationDispatcher::new(service.clone(), template());

        let report = dispatcher.dispatch(Some(&alice()), &[]).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.total_created() + report.total_errors(), 0);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_makes_no_calls() {
        let service = FakeService::new();
        let dispatcher = RemediationDispatcher::new(service.clone(), template());

        let err = dispatcher
            .dispatch(None, &[item("1", "Enable MFA")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DispatchErrorKind::Unauthenticated);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_failed_precondition() {
        let config = JiraConfig {
            base_url: None,
            email: None,
            api_token: None,
            project_key: Some("SEC".into()),
            issue_type: "Task".into(),
            labels: vec![],
            concurrency: 2,
            timeout_secs: 5,
        };
        let dispatcher = RemediationDispatcher::from_config(&config);
        assert!(!dispatcher.is_configured());

        let err = dispatcher
            .dispatch(Some(&alice()), &[item("1", "Enable MFA")])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DispatchErrorKind::FailedPrecondition);
        assert!(err.to_string().contains("JIRA_BASE_URL"));
    }

    #[tokio::test]
    async fn test_dispatch_json_rejects_non_list() {
        let dispatcher = RemediationDispatcher::new(FakeService::new(), template());
        let err = dispatcher
            .dispatch_json(Some(&alice()), &json!({"id": "1"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), DispatchErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_dispatch_json_lenient_items() {
        let service = FakeService::new();
        let dispatcher = RemediationDispatcher::new(service.clone(), template());
        let items = json!([
            { "title": "Patch servers", "priority": "URGENT", "controls": "CIS-7, NIST-3.4.1" },
            "not an object",
            { "id": 9, "title": "Log reviews", "priority": "low" }
        ]);

        let report = dispatcher.dispatch_json(Some(&alice()), &items).await.unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);

        let first = report.outcomes()[0].item();
        assert_eq!(first.id, "item-1");
        assert_eq!(first.priority, Priority::Medium);
        assert_eq!(first.controls, vec!["CIS-7", "NIST-3.4.1"]);

        assert!(!report.outcomes()[1].is_created());
        assert_eq!(report.outcomes()[1].item().id, "item-2");

        let third = report.outcomes()[2].item();
        assert_eq!(third.id, "9");
        assert_eq!(third.priority, Priority::Low);
    }
}
