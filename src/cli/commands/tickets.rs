//! Ticket creation from a saved analysis.

use std::path::Path;

use serde_json::Value;

use crate::auth::Identity;
use crate::config::Config;
use crate::tickets::RemediationDispatcher;

use crate::cli::helpers::{dispatch_error, print_report};

/// Pull the action item list out of a saved analysis, either bare or the
/// `{analysis, tickets}` document from `analyze --json --tickets`. A bare
/// list is used as-is; anything else is handed on and rejected by the
/// dispatcher.
pub fn action_items(saved: Value) -> Value {
    match saved {
        Value::Object(mut obj) => {
            if let Some(analysis @ Value::Object(_)) = obj.remove("analysis") {
                return action_items(analysis);
            }
            obj.remove("actionItems").unwrap_or(Value::Object(obj))
        }
        other => other,
    }
}

/// Create one ticket per action item in a saved analysis file.
pub async fn cmd_tickets(
    config: &Config,
    identity: Option<Identity>,
    file: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file).await?;
    let saved: Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("{} is not valid JSON: {}", file.display(), e))?;

    let dispatcher = RemediationDispatcher::from_config(&config.jira);
    let report = dispatcher
        .dispatch_json(identity.as_ref(), &action_items(saved))
        .await
        .map_err(dispatch_error)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
