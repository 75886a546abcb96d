//! Response schema sent with structured analysis requests.

use serde_json::{json, Value};

/// Schema for the compliance result, in the OpenAPI subset the engine
/// accepts for `responseSchema`.
pub fn compliance_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "overallScore": {
                "type": "INTEGER",
                "description": "Overall compliance score from 0 to 100"
            },
            "complianceLevel": {
                "type": "STRING",
                "enum": ["Excellent", "Good", "Fair", "Poor", "Critical"]
            },
            "summary": {
                "type": "STRING",
                "description": "Markdown summary of the key findings"
            },
            "actionItems": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "description": { "type": "STRING" },
                        "priority": { "type": "STRING", "enum": ["High", "Medium", "Low"] },
                        "effort": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
                        "timeline": { "type": "STRING" },
                        "controls": {
                            "type": "ARRAY",
                            "description": "One control identifier per entry, e.g. NIST-3.5.3",
                            "items": { "type": "STRING" }
                        }
                    },
                    "required": ["id", "title", "description", "priority", "effort", "timeline", "controls"],
                    "propertyOrdering": ["id", "title", "description", "priority", "effort", "timeline", "controls"]
                }
            }
        },
        "required": ["overallScore", "complianceLevel", "summary", "actionItems"],
        "propertyOrdering": ["overallScore", "complianceLevel", "summary", "actionItems"]
    })
}
