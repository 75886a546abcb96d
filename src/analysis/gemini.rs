//! Google Gemini analysis engine.
//!
//! Calls `generateContent` with the variant's instructions as the system
//! instruction and the document text as the user turn. Structured variants
//! send a `responseSchema` and ask for `application/json`.
//! Requires GEMINI_API_KEY (or `engine.api_key` in the config file).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::config::EngineConfig;
use super::engine::{AnalysisEngine, EnginePrompt, EngineResponse};
use super::error::AnalysisError;
use super::request::AnalysisRequest;
use crate::http_client::{HttpClient, HttpError, RequestAuth};

const API_KEY_HEADER: &str = "x-goog-api-key";
const SAFETY_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "IMAGE_SAFETY",
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Map an HTTP failure onto the analysis error taxonomy. The API's own
/// `error.status` wins over the HTTP code when it is recognised.
fn map_api_error(http_status: u16, api_status: Option<&str>, message: String) -> AnalysisError {
    match api_status {
        Some("INVALID_ARGUMENT") => return AnalysisError::InvalidArgument(message),
        Some("UNAUTHENTICATED") | Some("PERMISSION_DENIED") | Some("FAILED_PRECONDITION") => {
            return AnalysisError::FailedPrecondition(message)
        }
        // NOT_FOUND is an unknown model name.
        Some("NOT_FOUND") => return AnalysisError::FailedPrecondition(message),
        Some("RESOURCE_EXHAUSTED") => return AnalysisError::ResourceExhausted(message),
        _ => {}
    }
    match http_status {
        400 => AnalysisError::InvalidArgument(message),
        401 | 403 | 404 => AnalysisError::FailedPrecondition(message),
        429 => AnalysisError::ResourceExhausted(message),
        _ => AnalysisError::Internal(message),
    }
}

/// Gemini-backed `AnalysisEngine`.
pub struct GeminiEngine {
    client: HttpClient,
    config: EngineConfig,
}

impl GeminiEngine {
    pub fn new(config: EngineConfig) -> Result<Self, HttpError> {
        let client =
            HttpClient::builder("gemini", Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request(&self, request: &AnalysisRequest, prompt: &EnginePrompt) -> GenerateRequest {
        let mut document = request.document_text().to_string();
        if !request.params().is_empty() {
            let context: Vec<String> = request
                .params()
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect();
            document = format!("{}\n\nAdditional context:\n{}", document, context.join("\n"));
        }

        GenerateRequest {
            system_instruction: GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: prompt.instructions.clone(),
                }],
            },
            contents: vec![GeminiContent {
                role: Some("user"),
                parts: vec![GeminiPart { text: document }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
                response_mime_type: prompt
                    .expects_structure()
                    .then_some("application/json"),
                response_schema: prompt.response_schema.clone(),
            },
        }
    }
}

#[async_trait]
impl AnalysisEngine for GeminiEngine {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(
        &self,
        request: &AnalysisRequest,
        prompt: &EnginePrompt,
    ) -> Result<EngineResponse, AnalysisError> {
        let api_key = self.config.api_key().ok_or_else(|| {
            AnalysisError::FailedPrecondition("GEMINI_API_KEY is not set".to_string())
        })?;
        let auth = RequestAuth::Header {
            name: API_KEY_HEADER,
            value: api_key.to_string(),
        };

        let body = self.build_request(request, prompt);
        info!(
            "Requesting analysis from {} for user {} ({} chars)",
            self.config.model,
            request.identity().user_id(),
            request.document_text().len()
        );

        let response = self
            .client
            .post_json(&self.generate_url(), &body, &auth)
            .await
            .map_err(|e| AnalysisError::Internal(e.to_string()))?;

        let status = response.status.as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| AnalysisError::Internal(format!("failed to read response: {}", e)))?;

        if !(200..300).contains(&status) {
            let (api_status, message) = match serde_json::from_str::<ErrorEnvelope>(&text) {
                Ok(envelope) => (envelope.error.status, envelope.error.message),
                Err(_) => (None, format!("Gemini API error ({})", status)),
            };
            warn!("Gemini returned HTTP {}: {}", status, message);
            return Err(map_api_error(status, api_status.as_deref(), message));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text).map_err(|e| {
            AnalysisError::MalformedResponse(format!("unexpected response body: {}", e))
        })?;

        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AnalysisError::SafetyRejected(format!(
                "prompt blocked ({})",
                reason
            )));
        }

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            AnalysisError::MalformedResponse("response contained no candidates".to_string())
        })?;

        if let Some(reason) = candidate.finish_reason.as_deref() {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(AnalysisError::SafetyRejected(format!(
                    "generation stopped ({})",
                    reason
                )));
            }
        }

        let output: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        debug!("Gemini returned {} chars", output.len());

        if prompt.expects_structure() {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(output.trim()) {
                return Ok(EngineResponse::Structured(value));
            }
        }
        Ok(EngineResponse::Text(output))
    }
}
