//! Configuration management using the prefer crate.
//!
//! One file (TOML, YAML or JSON) with `extraction`, `engine` and `jira`
//! sections, every field optional. Environment variables override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::analysis::EngineConfig;
use crate::extract::ExtractionConfig;
use crate::tickets::JiraConfig;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upload limits and preview settings
    #[serde(default, skip_serializing_if = "ExtractionConfig::is_default")]
    pub extraction: ExtractionConfig,
    /// Analysis engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Ticketing settings
    #[serde(default)]
    pub jira: JiraConfig,
    /// File this config was loaded from
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults (with env overrides) when no file is found.
    pub async fn load() -> Self {
        match prefer::load("policy-compass").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            warn!("Ignoring config file {}: {}", path.display(), e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Format is chosen by extension; anything unknown is read as JSON.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(&contents, ext)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse config text in the given format and apply env overrides.
    pub fn parse(contents: &str, format: &str) -> Result<Self, String> {
        let config: Config = match format {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };
        Ok(config.with_env_overrides())
    }

    /// Apply environment overrides to every section.
    pub fn with_env_overrides(mut self) -> Self {
        self.engine = self.engine.with_env_overrides();
        self.jira = self.jira.with_env_overrides();
        self
    }

    /// Copy with secrets replaced, for display.
    pub fn redacted(&self) -> Self {
        Self {
            extraction: self.extraction.clone(),
            engine: self.engine.redacted(),
            jira: self.jira.redacted(),
            source_path: self.source_path.clone(),
        }
    }

    /// Problems that will make an operation fail later.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.extraction.min_bytes >= self.extraction.max_bytes {
            problems.push(format!(
                "extraction.min_bytes ({}) must be below extraction.max_bytes ({})",
                self.extraction.min_bytes, self.extraction.max_bytes
            ));
        }
        if Url::parse(&self.engine.endpoint).is_err() {
            problems.push(format!("engine.endpoint '{}' is not a URL", self.engine.endpoint));
        }
        if self.engine.api_key().is_none() {
            problems.push("GEMINI_API_KEY is not set; analysis will fail".to_string());
        }
        if let Some(base_url) = self.jira.base_url.as_deref() {
            if Url::parse(base_url).is_err() {
                problems.push(format!("jira.base_url '{}' is not a URL", base_url));
            }
        }
        if let Err(missing) = self.jira.credentials() {
            problems.push(format!(
                "ticketing disabled, missing {}",
                missing.join(", ")
            ));
        }
        if self.jira.template().is_none() {
            problems.push("ticketing disabled, missing JIRA_PROJECT_KEY".to_string());
        }

        problems
    }
}
