//! Analysis result types.

use serde::{Deserialize, Serialize};

/// Qualitative compliance band. `Unknown` only appears on fallback results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
    Unknown,
}

impl ComplianceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
            Self::Critical => "Critical",
            Self::Unknown => "Unknown",
        }
    }

    /// Parse one of the five assessed levels. `Unknown` is not accepted
    /// from an engine.
    pub fn parse_assessed(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "excellent" => Some(Self::Excellent),
            "good" => Some(Self::Good),
            "fair" => Some(Self::Fair),
            "poor" => Some(Self::Poor),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Case-insensitive parse.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    /// Total mapping from an optional label; anything unrecognised is Medium.
    pub fn from_label(label: Option<&str>) -> Self {
        label.and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effort {
    Low,
    #[default]
    Medium,
    High,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn from_label(label: Option<&str>) -> Self {
        label.and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A discrete, actionable fix derived from the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemediationItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub effort: Effort,
    pub timeline: String,
    /// One control identifier per entry, e.g. `NIST-3.5.3`.
    pub controls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResult {
    /// 0-100.
    pub overall_score: u8,
    pub compliance_level: ComplianceLevel,
    pub summary: String,
    pub action_items: Vec<RemediationItem>,
}

/// Free-form output from a variant that doesn't request structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTextResult {
    pub text: String,
}

/// What the caller gets when a structured response couldn't be validated.
/// Score 0, level `Unknown`, no items, plus the raw output for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackResult {
    pub overall_score: u8,
    pub compliance_level: ComplianceLevel,
    pub summary: String,
    pub action_items: Vec<RemediationItem>,
    pub note: String,
    pub raw_text: String,
}

impl FallbackResult {
    pub fn new(note: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        Self {
            overall_score: 0,
            compliance_level: ComplianceLevel::Unknown,
            summary: raw_text.clone(),
            action_items: Vec::new(),
            note: note.into(),
            raw_text,
        }
    }
}

/// Outcome of a successful analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalysisResult {
    Structured(StructuredResult),
    RawText(RawTextResult),
    Fallback(FallbackResult),
}

impl AnalysisResult {
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    pub fn overall_score(&self) -> Option<u8> {
        match self {
            Self::Structured(r) => Some(r.overall_score),
            Self::Fallback(r) => Some(r.overall_score),
            Self::RawText(_) => None,
        }
    }

    pub fn compliance_level(&self) -> Option<ComplianceLevel> {
        match self {
            Self::Structured(r) => Some(r.compliance_level),
            Self::Fallback(r) => Some(r.compliance_level),
            Self::RawText(_) => None,
        }
    }

    /// Remediation items; empty for anything but a structured result.
    pub fn action_items(&self) -> &[RemediationItem] {
        match self {
            Self::Structured(r) => &r.action_items,
            _ => &[],
        }
    }
}
