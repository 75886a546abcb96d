//! Policy analysis command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::analysis::{AnalysisResult, RubricPolicy};
use crate::auth::Identity;
use crate::config::Config;
use crate::extract::SourceDocument;
use crate::pipeline::PolicyPipeline;
use crate::render::render_report_html;
use crate::tickets::DispatchReport;

use crate::cli::helpers::{
    analysis_error, dispatch_error, extract_with_progress, print_analysis, print_report, success,
};

pub struct AnalyzeOptions {
    pub as_text: bool,
    pub variant: Option<String>,
    pub rubric: Option<RubricPolicy>,
    pub params: BTreeMap<String, String>,
    pub json: bool,
    pub html: Option<PathBuf>,
    pub tickets: bool,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Analyze a policy document, optionally filing tickets for the findings.
pub async fn cmd_analyze(
    mut config: Config,
    identity: Option<Identity>,
    file: &Path,
    options: AnalyzeOptions,
) -> anyhow::Result<()> {
    if let Some(rubric) = options.rubric {
        config.engine.rubric = rubric;
    }

    let pipeline = PolicyPipeline::from_config(&config, identity)?;

    // Fail before extraction rather than after a long PDF run.
    if pipeline.identity().is_none() {
        anyhow::bail!("Sign in first: pass --user and --token (or set COMPASS_USER and COMPASS_ID_TOKEN)");
    }

    let (text, title) = if options.as_text {
        let text = tokio::fs::read_to_string(file).await?;
        (text, file_title(file))
    } else {
        let document = SourceDocument::from_path(file).await?;
        let extracted = extract_with_progress(&pipeline, document, !options.json).await?;
        let title = extracted.metadata().title.clone();
        (extracted.text(), title)
    };

    let pb = (!options.json).then(|| spinner("Analyzing policy..."));
    let analyzed = pipeline
        .analyze_with_params(&text, options.variant.as_deref(), &options.params)
        .await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let result = analyzed.map_err(analysis_error)?;

    if options.json {
        // One document on stdout: the analysis, plus the dispatch report
        // when tickets were requested.
        let tickets = if options.tickets {
            file_tickets(&pipeline, &result).await?
        } else {
            None
        };
        if let Some(path) = &options.html {
            tokio::fs::write(path, render_report_html(&title, &result)).await?;
        }
        println!("{}", json_output(&result, tickets.as_ref(), options.tickets)?);
        return Ok(());
    }

    print_analysis(&result);
    if let Some(path) = &options.html {
        tokio::fs::write(path, render_report_html(&title, &result)).await?;
        println!("\n{} Report written to {}", success(), path.display());
    }

    if options.tickets {
        if let Some(report) = file_tickets(&pipeline, &result).await? {
            println!("\n{}", style("Tickets").bold());
            print_report(&report);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct AnalyzeWithTickets<'a> {
    analysis: &'a AnalysisResult,
    tickets: Option<&'a DispatchReport>,
}

/// Without `--tickets` the bare analysis is printed, so the output can be
/// fed straight back to `compass tickets`.
fn json_output(
    result: &AnalysisResult,
    tickets: Option<&DispatchReport>,
    with_tickets: bool,
) -> serde_json::Result<String> {
    if with_tickets {
        serde_json::to_string_pretty(&AnalyzeWithTickets {
            analysis: result,
            tickets,
        })
    } else {
        serde_json::to_string_pretty(result)
    }
}

/// Dispatch the result's action items. `None` when the result carries no
/// structured items.
async fn file_tickets(
    pipeline: &PolicyPipeline,
    result: &AnalysisResult,
) -> anyhow::Result<Option<DispatchReport>> {
    if !result.is_structured() {
        eprintln!(
            "{} No structured action items; skipping ticket creation",
            style("!").yellow()
        );
        return Ok(None);
    }

    let report = pipeline
        .dispatch_remediation(result.action_items())
        .await
        .map_err(dispatch_error)?;
    Ok(Some(report))
}

fn file_title(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "Policy".to_string())
}
