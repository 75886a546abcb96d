//! End-to-end pipeline flow with in-memory collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::json;

use policy_compass::analysis::{
    AnalysisEngine, AnalysisError, AnalysisErrorKind, AnalysisRequest, AnalysisResult, Analyzer,
    EnginePrompt, EngineResponse,
};
use policy_compass::auth::Identity;
use policy_compass::extract::{
    BackendError, DocumentExtractor, ExtractionConfig, ExtractionError, PdfBackend, PdfInfo,
    SourceDocument,
};
use policy_compass::pipeline::PolicyPipeline;
use policy_compass::tickets::{
    CreatedIssue, IssuePayload, RemediationDispatcher, TicketService, TicketServiceError,
    TicketTemplate,
};

const POLICY_PAGES: [&str; 3] = [
    "Acceptable Use Policy\nAll employees must protect company systems.",
    "Access Control\nMFA required for privileged accounts. Passwords rotate every 90 days.",
    "Incident Response\nReport suspected incidents to the security team within 24 hours.",
];

struct MemoryBackend {
    pages: Vec<String>,
    page_delay: Duration,
}

impl MemoryBackend {
    fn policy() -> Self {
        Self {
            pages: POLICY_PAGES.iter().map(|p| p.to_string()).collect(),
            page_delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl PdfBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }
    fn is_available(&self) -> bool {
        true
    }
    fn availability_hint(&self) -> String {
        String::new()
    }
    async fn page_count(&self, _path: &Path) -> Result<u32, BackendError> {
        Ok(self.pages.len() as u32)
    }
    async fn page_text(&self, _path: &Path, page: u32) -> Result<String, BackendError> {
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
        Ok(self.pages[(page - 1) as usize].clone())
    }
    async fn metadata(&self, _path: &Path) -> Result<PdfInfo, BackendError> {
        Ok(PdfInfo {
            title: Some("Acceptable Use Policy".to_string()),
            pages: Some(self.pages.len() as u32),
            ..PdfInfo::default()
        })
    }
    async fn render_preview(&self, _: &Path, _: u32, _: u32) -> Result<Vec<u8>, BackendError> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}

/// Answers every request with a fixed compliance result and records what
/// it was sent.
#[derive(Default)]
struct PolicyEngine {
    calls: AtomicUsize,
    seen_text: Mutex<Option<String>>,
}

#[async_trait]
impl AnalysisEngine for PolicyEngine {
    fn name(&self) -> &'static str {
        "policy-engine"
    }

    async fn generate(
        &self,
        request: &AnalysisRequest,
        _prompt: &EnginePrompt,
    ) -> Result<EngineResponse, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen_text.lock().unwrap() = Some(request.document_text().to_string());

        let body = json!({
            "overallScore": 68,
            "complianceLevel": "Fair",
            "summary": "MFA is covered for **privileged** accounts only.",
            "actionItems": [
                {
                    "id": "1",
                    "title": "Extend MFA to all remote access",
                    "description": "MFA currently applies to privileged accounts only.",
                    "priority": "High",
                    "effort": "Medium",
                    "timeline": "30 days",
                    "controls": ["NIST-3.5.3, ISO-27001-A.9.2.3"]
                },
                {
                    "id": "2",
                    "title": "Define incident severity levels",
                    "description": "Add severity tiers and escalation paths.",
                    "priority": "Medium",
                    "effort": "Low",
                    "timeline": "60 days",
                    "controls": ["NIST-3.6.1"]
                }
            ]
        });
        // Engines often fence their JSON.
        Ok(EngineResponse::Text(format!("```json\n{}\n```", body)))
    }
}

#[derive(Default)]
struct RecordingTickets {
    summaries: Mutex<Vec<String>>,
}

#[async_trait]
impl TicketService for RecordingTickets {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue, TicketServiceError> {
        let mut summaries = self.summaries.lock().unwrap();
        summaries.push(payload.fields.summary.clone());
        Ok(CreatedIssue {
            key: format!("SEC-{}", summaries.len()),
            id: None,
        })
    }

    fn browse_url(&self, key: &str) -> String {
        format!("https://acme.atlassian.net/browse/{}", key)
    }
}

fn pdf_upload() -> SourceDocument {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(4096, b' ');
    SourceDocument::new(bytes)
        .with_declared_type("application/pdf")
        .with_file_name("acceptable-use.pdf")
}

fn pipeline(
    backend: MemoryBackend,
    engine: Arc<PolicyEngine>,
    tickets: Arc<RecordingTickets>,
    identity: Option<Identity>,
) -> PolicyPipeline {
    let template = TicketTemplate {
        project_key: "SEC".to_string(),
        issue_type: "Task".to_string(),
        labels: vec!["policy-compass".to_string()],
    };
    PolicyPipeline::new(
        DocumentExtractor::new(Arc::new(backend), ExtractionConfig::default()),
        Analyzer::new(engine),
        RemediationDispatcher::new(tickets, template),
        identity,
    )
}

#[tokio::test]
async fn test_extract_analyze_dispatch() {
    let engine = Arc::new(PolicyEngine::default());
    let tickets = Arc::new(RecordingTickets::default());
    let pipeline = pipeline(
        MemoryBackend::policy(),
        engine.clone(),
        tickets.clone(),
        Identity::new("alice", "id-token"),
    );

    let mut task = pipeline.extract(pdf_upload());
    let progress = task.take_progress().unwrap();
    let events: Vec<_> = progress.collect().await;
    let extracted = task.join().await.unwrap().unwrap();

    assert_eq!(extracted.page_count(), 3);
    assert_eq!(extracted.metadata().page_count, 3);
    assert_eq!(extracted.metadata().title, "Acceptable Use Policy");
    assert_eq!(events.len(), 3);
    assert_eq!(events.last().unwrap().percent, 100);

    let result = pipeline.analyze(&extracted.text(), None).await.unwrap();
    let AnalysisResult::Structured(structured) = &result else {
        panic!("expected structured result, got {:?}", result);
    };
    assert_eq!(structured.overall_score, 68);
    assert_eq!(
        structured.action_items[0].controls,
        vec!["NIST-3.5.3", "ISO-27001-A.9.2.3"]
    );
    assert!(engine
        .seen_text
        .lock()
        .unwrap()
        .as_deref()
        .unwrap()
        .contains("MFA required for privileged accounts"));

    let report = pipeline
        .dispatch_remediation(result.action_items())
        .await
        .unwrap();
    assert_eq!(report.total_created(), 2);
    assert_eq!(report.total_errors(), 0);
    let keys: Vec<&str> = report.created().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["SEC-1", "SEC-2"]);
    assert_eq!(tickets.summaries.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unauthenticated_analysis_makes_no_engine_call() {
    let engine = Arc::new(PolicyEngine::default());
    let pipeline = pipeline(
        MemoryBackend::policy(),
        engine.clone(),
        Arc::new(RecordingTickets::default()),
        None,
    );

    let err = pipeline
        .analyze("Acceptable Use Policy. MFA required.", None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), AnalysisErrorKind::Unauthenticated);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_dispatch_is_not_an_error() {
    let tickets = Arc::new(RecordingTickets::default());
    let pipeline = pipeline(
        MemoryBackend::policy(),
        Arc::new(PolicyEngine::default()),
        tickets.clone(),
        Identity::new("alice", "id-token"),
    );

    let report = pipeline.dispatch_remediation(&[]).await.unwrap();
    assert!(report.is_empty());
    assert!(tickets.summaries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_upload_does_no_work() {
    let pipeline = pipeline(
        MemoryBackend::policy(),
        Arc::new(PolicyEngine::default()),
        Arc::new(RecordingTickets::default()),
        None,
    );

    let mut task = pipeline.extract(SourceDocument::new(b"%PDF-1.7 tiny".to_vec()));
    let progress = task.take_progress().unwrap();
    let events: Vec<_> = progress.collect().await;

    let err = task.join().await.unwrap().unwrap_err();
    assert!(matches!(err, ExtractionError::TooSmall { .. }));
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_abandoned_extraction_yields_nothing() {
    let backend = MemoryBackend {
        pages: (0..50).map(|i| format!("page {}", i)).collect(),
        page_delay: Duration::from_millis(20),
    };
    let pipeline = pipeline(
        backend,
        Arc::new(PolicyEngine::default()),
        Arc::new(RecordingTickets::default()),
        None,
    );

    let mut task = pipeline.extract(pdf_upload());
    let mut progress = task.take_progress().unwrap();

    let first = progress.next().await.unwrap();
    assert_eq!(first.pages_done, 1);
    task.abandon();
    assert!(task.is_abandoned());

    // Whatever was already queued may drain; the stream then ends early.
    let rest: Vec<_> = progress.collect().await;
    assert!(rest.len() < 49);
    assert!(task.join().await.is_none());
}
