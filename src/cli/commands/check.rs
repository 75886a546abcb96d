//! Tool and service availability check.

use console::style;

use crate::config::Config;
use crate::extract::{PdfBackend, PopplerBackend};

use crate::cli::helpers::{failure, success};

/// Check PDF tools and service configuration.
pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("PDF Tools").bold());
    println!("{}", "-".repeat(50));

    let mut all_found = true;
    for (tool, available) in PopplerBackend::check_tools() {
        let status = if available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }
    if !all_found {
        println!(
            "  {}",
            style(PopplerBackend::new().availability_hint()).dim()
        );
    }

    println!("\n{}", style("Services").bold());
    println!("{}", "-".repeat(50));

    let engine_status = if config.engine.api_key().is_some() {
        style(format!("✓ {}", config.engine.model)).green()
    } else {
        style("✗ GEMINI_API_KEY not set".to_string()).red()
    };
    println!("  {:<15} {}", "Gemini", engine_status);

    let jira_status = match (config.jira.credentials(), config.jira.template()) {
        (Ok(creds), Some(template)) => {
            style(format!("✓ {} ({})", creds.base_url, template.project_key)).green()
        }
        (Err(missing), _) => style(format!("✗ missing {}", missing.join(", "))).red(),
        (Ok(_), None) => style("✗ missing JIRA_PROJECT_KEY".to_string()).red(),
    };
    println!("  {:<15} {}", "Jira", jira_status);

    let problems = config.problems();
    println!();
    if all_found && problems.is_empty() {
        println!("{} Ready", success());
    } else {
        for problem in problems {
            println!("{} {}", failure(), problem);
        }
    }

    Ok(())
}
