//! Caller-facing pipeline: extract, analyze, dispatch.
//!
//! Holds the caller's identity and one instance of each stage. Every
//! operation is an independent async call; nothing is shared between
//! invocations apart from the configured collaborators.

use std::collections::BTreeMap;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::analysis::{AnalysisError, AnalysisResult, Analyzer, RemediationItem};
use crate::auth::Identity;
use crate::config::Config;
use crate::extract::{
    progress_channel, DocumentExtractor, ExtractedDocument, ExtractionError, Liveness,
    ProgressStream, SourceDocument,
};
use crate::http_client::HttpError;
use crate::tickets::{DispatchError, DispatchReport, RemediationDispatcher};

/// An extraction running in the background.
pub struct ExtractionTask {
    progress: Option<ProgressStream>,
    liveness: Liveness,
    handle: JoinHandle<Result<ExtractedDocument, ExtractionError>>,
}

impl ExtractionTask {
    /// Take the progress stream. Only the first call returns it.
    pub fn take_progress(&mut self) -> Option<ProgressStream> {
        self.progress.take()
    }

    pub fn is_abandoned(&self) -> bool {
        !self.liveness.is_alive()
    }

    /// Stop caring about this extraction. Further progress is dropped and
    /// the task is aborted at its next suspension point.
    pub fn abandon(&self) {
        debug!("Extraction abandoned");
        self.liveness.abandon();
        self.handle.abort();
    }

    /// Wait for the result. `None` if the extraction was abandoned.
    pub async fn join(self) -> Option<Result<ExtractedDocument, ExtractionError>> {
        match self.handle.await {
            Ok(result) if self.liveness.is_alive() => Some(result),
            Ok(_) => None,
            Err(e) if e.is_cancelled() => None,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}

/// Extraction, analysis and ticket dispatch for one caller.
#[derive(Clone)]
pub struct PolicyPipeline {
    extractor: DocumentExtractor,
    analyzer: Analyzer,
    dispatcher: RemediationDispatcher,
    identity: Option<Identity>,
}

impl PolicyPipeline {
    pub fn new(
        extractor: DocumentExtractor,
        analyzer: Analyzer,
        dispatcher: RemediationDispatcher,
        identity: Option<Identity>,
    ) -> Self {
        Self {
            extractor,
            analyzer,
            dispatcher,
            identity,
        }
    }

    /// Poppler extraction, Gemini analysis and Jira dispatch from config.
    pub fn from_config(config: &Config, identity: Option<Identity>) -> Result<Self, HttpError> {
        Ok(Self::new(
            DocumentExtractor::poppler(config.extraction.clone()),
            Analyzer::gemini(config.engine.clone())?,
            RemediationDispatcher::from_config(&config.jira),
            identity,
        ))
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn extractor(&self) -> &DocumentExtractor {
        &self.extractor
    }

    pub fn dispatcher(&self) -> &RemediationDispatcher {
        &self.dispatcher
    }

    /// Start extracting `document` on a background task.
    pub fn extract(&self, document: SourceDocument) -> ExtractionTask {
        let liveness = Liveness::new();
        let (sink, stream) = progress_channel(liveness.clone());
        let extractor = self.extractor.clone();

        let handle = tokio::spawn(async move { extractor.extract(&document, &sink).await });

        ExtractionTask {
            progress: Some(stream),
            liveness,
            handle,
        }
    }

    /// Analyze extracted text. `variant` selects the analysis; `None` is the
    /// default compliance analysis.
    pub async fn analyze(
        &self,
        text: &str,
        variant: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyzer
            .analyze(self.identity.as_ref(), text, variant)
            .await
    }

    /// Analyze with extra key/value context passed to the engine.
    pub async fn analyze_with_params(
        &self,
        text: &str,
        variant: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyzer
            .analyze_with_params(self.identity.as_ref(), text, variant, params)
            .await
    }

    /// Create one ticket per remediation item.
    pub async fn dispatch_remediation(
        &self,
        items: &[RemediationItem],
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatcher.dispatch(self.identity.as_ref(), items).await
    }

    /// Dispatch an untyped item list, e.g. loaded from a saved analysis.
    pub async fn dispatch_remediation_json(
        &self,
        items: &Value,
    ) -> Result<DispatchReport, DispatchError> {
        self.dispatcher
            .dispatch_json(self.identity.as_ref(), items)
            .await
    }
}
