//! Policy analysis: request construction, engine calls, result validation.

mod config;
mod engine;
mod error;
mod gemini;
mod prompts;
mod request;
mod schema;
mod types;
mod validate;

pub use config::EngineConfig;
pub use engine::{AnalysisEngine, EnginePrompt, EngineResponse};
pub use error::{AnalysisError, AnalysisErrorKind};
pub use gemini::GeminiEngine;
pub use prompts::{build_prompt, AnalysisVariant, RubricPolicy};
pub use request::{AnalysisRequest, AnalysisRequestBuilder, RequestError};
pub use schema::compliance_response_schema;
pub use types::{
    AnalysisResult, ComplianceLevel, Effort, FallbackResult, Priority, RawTextResult,
    RemediationItem, StructuredResult,
};
pub use validate::{split_controls, strip_code_fence, validate_response, FALLBACK_NOTE};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::auth::Identity;
use crate::http_client::HttpError;

/// Runs analyses against one engine with a fixed rubric.
#[derive(Clone)]
pub struct Analyzer {
    engine: Arc<dyn AnalysisEngine>,
    rubric: RubricPolicy,
    custom_prompt: Option<String>,
}

impl Analyzer {
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        Self {
            engine,
            rubric: RubricPolicy::default(),
            custom_prompt: None,
        }
    }

    /// Analyzer backed by Gemini, taking rubric and prompt from the config.
    pub fn gemini(config: EngineConfig) -> Result<Self, HttpError> {
        let rubric = config.rubric;
        let custom_prompt = config.prompt.clone();
        let engine = GeminiEngine::new(config)?;
        Ok(Self::new(Arc::new(engine))
            .with_rubric(rubric)
            .with_custom_prompt(custom_prompt))
    }

    pub fn with_rubric(mut self, rubric: RubricPolicy) -> Self {
        self.rubric = rubric;
        self
    }

    pub fn with_custom_prompt(mut self, prompt: Option<String>) -> Self {
        self.custom_prompt = prompt.filter(|p| !p.trim().is_empty());
        self
    }

    /// Analyze document text on behalf of `identity`.
    ///
    /// Preconditions are checked before the engine is contacted: no identity
    /// is `Unauthenticated`, blank text or an unknown variant is
    /// `InvalidArgument`. A structured response that fails validation comes
    /// back as `AnalysisResult::Fallback`, not as an error.
    pub async fn analyze(
        &self,
        identity: Option<&Identity>,
        text: &str,
        variant: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with_params(identity, text, variant, &BTreeMap::new())
            .await
    }

    /// [`Analyzer::analyze`] with free-form context for the engine.
    pub async fn analyze_with_params(
        &self,
        identity: Option<&Identity>,
        text: &str,
        variant: Option<&str>,
        params: &BTreeMap<String, String>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::builder()
            .identity(identity.cloned())
            .text(text)
            .variant(variant)
            .params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .build()?;
        let variant = AnalysisVariant::parse(request.variant())?;
        let prompt = build_prompt(variant, self.rubric, self.custom_prompt.as_deref());

        info!(
            "Analyzing {} chars with {} ({} variant, {} rubric)",
            text.len(),
            self.engine.name(),
            variant.as_str(),
            self.rubric.as_str()
        );
        let response = self.engine.generate(&request, &prompt).await?;
        validate_response(response, prompt.expects_structure())
    }
}
