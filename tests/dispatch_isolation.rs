//! Ticket dispatch against a mock Jira: per-item failures stay isolated.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use policy_compass::analysis::{Effort, Priority, RemediationItem};
use policy_compass::auth::Identity;
use policy_compass::tickets::{DispatchErrorKind, JiraConfig, RemediationDispatcher};

fn jira_config(server: &MockServer) -> JiraConfig {
    JiraConfig {
        base_url: Some(server.uri()),
        email: Some("compass-bot@acme.test".to_string()),
        api_token: Some("api-token".to_string()),
        project_key: Some("SEC".to_string()),
        issue_type: "Task".to_string(),
        labels: vec!["policy-compass".to_string()],
        concurrency: 3,
        timeout_secs: 5,
    }
}

fn item(id: &str, title: &str, controls: &[&str]) -> RemediationItem {
    RemediationItem {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("Remediate: {}", title),
        priority: Priority::High,
        effort: Effort::Medium,
        timeline: "30 days".to_string(),
        controls: controls.iter().map(|c| c.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_item_k_fails_others_succeed() {
    let server = MockServer::start().await;

    // Mounted first so it wins for the matching item.
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({ "fields": { "summary": "Encrypt laptops" } })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorMessages": [],
            "errors": { "priority": "The priority selected is invalid." }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({
            "fields": { "project": { "key": "SEC" }, "issuetype": { "name": "Task" } }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "10010", "key": "SEC-42"
        })))
        .expect(3)
        .mount(&server)
        .await;

    let items = vec![
        item("1", "Enforce MFA", &["NIST-3.5.3"]),
        item("2", "Rotate service keys", &[]),
        item("3", "Encrypt laptops", &["ISO-27001-A.10.1.1"]),
        item("4", "Review access quarterly", &["ISO-27001-A.9.2.5"]),
    ];

    let dispatcher = RemediationDispatcher::from_config(&jira_config(&server));
    let identity = Identity::new("alice", "id-token");
    let report = dispatcher.dispatch(identity.as_ref(), &items).await.unwrap();

    assert_eq!(report.len(), 4);
    assert_eq!(report.total_created(), 3);
    assert_eq!(report.total_errors(), 1);

    let order: Vec<&str> = report.outcomes().iter().map(|o| o.item().id.as_str()).collect();
    assert_eq!(order, vec!["1", "2", "3", "4"]);
    assert!(!report.outcomes()[2].is_created());

    let error = report.errors().next().unwrap();
    assert_eq!(error.item.id, "3");
    assert!(error.error.contains("The priority selected is invalid."));

    let record = report.created().next().unwrap();
    assert_eq!(record.url, format!("{}/browse/SEC-42", server.uri()));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["totalCreated"], 3);
    assert_eq!(json["totalErrors"], 1);
}

#[tokio::test]
async fn test_server_error_with_plain_body_recorded_at_its_position() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({ "fields": { "summary": "Rotate service keys" } })))
        .respond_with(
            ResponseTemplate::new(503)
                .set_body_raw("<html>Service Unavailable</html>", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "SEC-7" })))
        .expect(2)
        .mount(&server)
        .await;

    let items = vec![
        item("1", "Enforce MFA", &[]),
        item("2", "Rotate service keys", &[]),
        item("3", "Encrypt laptops", &[]),
    ];

    let dispatcher = RemediationDispatcher::from_config(&jira_config(&server));
    let report = dispatcher
        .dispatch(Identity::new("alice", "id-token").as_ref(), &items)
        .await
        .unwrap();

    assert_eq!(report.len(), 3);
    assert_eq!(report.total_created(), 2);
    assert!(report.outcomes()[0].is_created());
    assert!(!report.outcomes()[1].is_created());
    assert!(report.outcomes()[2].is_created());

    let error = report.errors().next().unwrap();
    assert_eq!(error.item.id, "2");
    assert!(error.error.contains("Jira returned HTTP 503"));
}

#[tokio::test]
async fn test_labels_sent_to_jira() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/api/3/issue"))
        .and(body_partial_json(json!({
            "fields": {
                "priority": { "name": "High" },
                "labels": ["policy-compass", "priority-high", "nist-3-5-3", "iso-27001-a-9-2-3"]
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "SEC-1" })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = RemediationDispatcher::from_config(&jira_config(&server));
    let items = [item("1", "Enforce MFA", &["NIST-3.5.3", "ISO-27001-A.9.2.3"])];
    let report = dispatcher
        .dispatch(Identity::new("alice", "id-token").as_ref(), &items)
        .await
        .unwrap();

    assert_eq!(report.total_created(), 1);
}

#[tokio::test]
async fn test_preconditions_checked_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "key": "SEC-1" })))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = RemediationDispatcher::from_config(&jira_config(&server));
    let items = [item("1", "Enforce MFA", &[])];

    let err = dispatcher.dispatch(None, &items).await.unwrap_err();
    assert_eq!(err.kind(), DispatchErrorKind::Unauthenticated);

    let err = dispatcher
        .dispatch_json(Identity::new("alice", "id-token").as_ref(), &json!("not a list"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), DispatchErrorKind::InvalidArgument);
}
