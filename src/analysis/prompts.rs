//! Analysis variants, rubric policies and prompt construction.

use serde::{Deserialize, Serialize};

use super::engine::EnginePrompt;
use super::error::AnalysisError;
use super::schema::compliance_response_schema;

/// Stricter rubric: missing controls weigh heavily and scores above 80
/// require explicit evidence.
pub const STRICT_RUBRIC: &str = r#"Scoring rubric (strict):
- 90-100 Excellent: every expected control is stated explicitly, with owners, review cadence and enforcement.
- 75-89 Good: controls are present but one or two lack measurable requirements.
- 55-74 Fair: several controls are vague, optional or missing.
- 30-54 Poor: core controls (access control, MFA, incident response, data handling) are missing or contradictory.
- 0-29 Critical: the policy provides little or no enforceable security guidance.
Do not award more than 80 unless the text states concrete, testable requirements."#;

/// Baseline rubric for first-pass reviews.
pub const BASELINE_RUBRIC: &str = r#"Scoring rubric (baseline):
- 85-100 Excellent: comprehensive coverage of common security controls.
- 70-84 Good: most controls covered with minor gaps.
- 50-69 Fair: notable gaps that should be addressed this quarter.
- 25-49 Poor: significant gaps in core controls.
- 0-24 Critical: the policy is largely absent or unusable."#;

/// Default prompt for the compliance variant. `{rubric}` and `{content}` are
/// substituted before sending.
pub const DEFAULT_COMPLIANCE_PROMPT: &str = r#"You are a security compliance analyst reviewing an organizational security policy. Read the ENTIRE document and assess it against common frameworks (NIST SP 800-171, NIST CSF, ISO/IEC 27001, CIS Controls).

{rubric}

Produce:
1. overallScore: an integer from 0 to 100.
2. complianceLevel: one of Excellent, Good, Fair, Poor, Critical, consistent with the score.
3. summary: a short markdown summary of strengths and gaps.
4. actionItems: concrete remediation items. Each item has id, title, description, priority (High, Medium or Low), effort (Low, Medium or High), timeline (e.g. "30 days") and controls.

CRITICAL: list each control identifier as its own array entry, e.g. ["NIST-3.5.3", "ISO-27001-A.9.2.3"]. Never join several controls into one comma-separated string.

Document Content:
{content}

Respond with ONLY the JSON object."#;

/// Prompt for the free-form summary variant.
pub const SUMMARY_PROMPT: &str = r#"You are a security compliance analyst. Summarize the security policy below for an executive audience in markdown: what it covers, its most important gaps, and the three changes that would improve it most.

Document Content:
{content}"#;

/// Which analysis to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisVariant {
    /// Scored, structured result with remediation items.
    #[default]
    Compliance,
    /// Free-form markdown summary.
    Summary,
}

impl AnalysisVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compliance => "compliance",
            Self::Summary => "summary",
        }
    }

    /// Resolve a requested variant name. Absent means the default.
    pub fn parse(name: Option<&str>) -> Result<Self, AnalysisError> {
        match name.map(|n| n.trim().to_lowercase()) {
            None => Ok(Self::default()),
            Some(n) if n.is_empty() => Ok(Self::default()),
            Some(n) => match n.as_str() {
                "compliance" => Ok(Self::Compliance),
                "summary" => Ok(Self::Summary),
                other => Err(AnalysisError::InvalidArgument(format!(
                    "unknown analysis variant '{}'",
                    other
                ))),
            },
        }
    }
}

/// Scoring strictness applied to the compliance variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RubricPolicy {
    #[default]
    Strict,
    Baseline,
}

impl RubricPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Baseline => "baseline",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "baseline" => Some(Self::Baseline),
            _ => None,
        }
    }

    pub fn rubric_text(&self) -> &'static str {
        match self {
            Self::Strict => STRICT_RUBRIC,
            Self::Baseline => BASELINE_RUBRIC,
        }
    }
}

/// Build the engine prompt for a variant. A custom prompt replaces the
/// default compliance prompt and may use the same placeholders; the document
/// text itself is sent separately, so `{content}` is replaced with a pointer.
pub fn build_prompt(
    variant: AnalysisVariant,
    rubric: RubricPolicy,
    custom_prompt: Option<&str>,
) -> EnginePrompt {
    match variant {
        AnalysisVariant::Compliance => {
            let template = custom_prompt.unwrap_or(DEFAULT_COMPLIANCE_PROMPT);
            EnginePrompt {
                instructions: fill(template, rubric.rubric_text()),
                response_schema: Some(compliance_response_schema()),
            }
        }
        AnalysisVariant::Summary => EnginePrompt {
            instructions: fill(SUMMARY_PROMPT, ""),
            response_schema: None,
        },
    }
}

fn fill(template: &str, rubric: &str) -> String {
    template
        .replace("{rubric}", rubric)
        .replace("{content}", "(provided in the next message)")
}
