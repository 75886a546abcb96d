//! Analysis engine configuration.

use serde::{Deserialize, Serialize};

use super::prompts::RubricPolicy;

/// Configuration for the Gemini analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model used for analysis
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (usually supplied via GEMINI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens in response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Scoring strictness for the compliance variant
    #[serde(default)]
    pub rubric: RubricPolicy,
    /// Custom compliance prompt (uses {rubric} and {content} placeholders)
    #[serde(default)]
    pub prompt: Option<String>,
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    8192
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::base_default().with_env_overrides()
    }
}

impl EngineConfig {
    /// Base default without env overrides.
    fn base_default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_timeout_secs(),
            rubric: RubricPolicy::default(),
            prompt: None,
        }
    }

    /// Check if the config equals the default (for skip_serializing_if).
    pub fn is_default(&self) -> bool {
        *self == Self::base_default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `GEMINI_API_KEY`: API key
    /// - `GEMINI_MODEL`: Model name
    /// - `GEMINI_ENDPOINT`: API base URL
    /// - `COMPASS_RUBRIC`: "strict" or "baseline"
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                self.model = model;
            }
        }
        if let Ok(endpoint) = std::env::var("GEMINI_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint.trim_end_matches('/').to_string();
            }
        }
        if let Ok(val) = std::env::var("COMPASS_RUBRIC") {
            if let Some(rubric) = RubricPolicy::parse(&val) {
                self.rubric = rubric;
            }
        }
        self
    }

    /// Copy suitable for display: the key is replaced by a marker.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api_key.is_some() {
            copy.api_key = Some("<redacted>".to_string());
        }
        copy
    }
}
