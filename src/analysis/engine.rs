//! Analysis engine abstraction.

use async_trait::async_trait;
use serde_json::Value;

use super::error::AnalysisError;
use super::request::AnalysisRequest;

/// Instructions handed to the engine alongside the request.
#[derive(Debug, Clone, PartialEq)]
pub struct EnginePrompt {
    pub instructions: String,
    /// When set, the engine is asked to answer with JSON matching this schema.
    pub response_schema: Option<Value>,
}

impl EnginePrompt {
    pub fn expects_structure(&self) -> bool {
        self.response_schema.is_some()
    }
}

/// What came back from the engine, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    /// Already parsed JSON (the engine honoured the schema).
    Structured(Value),
    /// Free text, possibly JSON wrapped in a code fence.
    Text(String),
}

#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &'static str;

    /// Run one generation. Failures must already be mapped onto the
    /// `AnalysisError` taxonomy.
    async fn generate(
        &self,
        request: &AnalysisRequest,
        prompt: &EnginePrompt,
    ) -> Result<EngineResponse, AnalysisError>;
}
