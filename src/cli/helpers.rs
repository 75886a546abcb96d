//! Shared helpers for CLI commands.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use console::{style, StyledObject};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::{AnalysisError, AnalysisResult};
use crate::auth::Identity;
use crate::config::Config;
use crate::extract::{ExtractedDocument, ExtractionError, ProgressStream, SourceDocument};
use crate::pipeline::PolicyPipeline;
use crate::tickets::{DispatchError, DispatchReport};
use crate::utils::format_duration;

pub fn success() -> StyledObject<&'static str> {
    style("✓").green()
}

pub fn failure() -> StyledObject<&'static str> {
    style("✗").red()
}

pub fn arrow() -> StyledObject<&'static str> {
    style("→").dim()
}

/// Explicit path first, then discovery.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(path)
                .await
                .map_err(|e| anyhow::anyhow!(e))
        }
        None => Ok(Config::load().await),
    }
}

/// Identity from flags (which clap already backs with the environment).
pub fn resolve_identity(user: Option<&str>, token: Option<&str>) -> Option<Identity> {
    match (user, token) {
        (Some(user), Some(token)) => Identity::new(user, token),
        _ => None,
    }
}

pub fn extraction_error(err: ExtractionError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", err.user_message(), err)
}

pub fn analysis_error(err: AnalysisError) -> anyhow::Error {
    anyhow::anyhow!("{} [{}: {}]", err.user_message(), err.kind(), err)
}

pub fn dispatch_error(err: DispatchError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", err.user_message(), err)
}

/// Run an extraction with a progress bar. Ctrl-C abandons it.
pub async fn extract_with_progress(
    pipeline: &PolicyPipeline,
    document: SourceDocument,
    show_progress: bool,
) -> anyhow::Result<ExtractedDocument> {
    let mut task = pipeline.extract(document);
    let mut progress = task.take_progress();

    let bar = if show_progress {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} pages {wide_msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Some(bar)
    } else {
        None
    };

    if let Some(stream) = progress.as_mut() {
        if !follow_progress(stream, bar.as_ref(), tokio::signal::ctrl_c()).await {
            task.abandon();
            if let Some(bar) = &bar {
                bar.abandon_with_message("cancelled");
            }
            anyhow::bail!("Extraction cancelled");
        }
    }

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    match task.join().await {
        Some(result) => result.map_err(extraction_error),
        None => anyhow::bail!("Extraction cancelled"),
    }
}

/// Drive `bar` from the progress stream until it ends or `cancel`
/// resolves. Returns false when cancelled.
async fn follow_progress<F: Future>(
    stream: &mut ProgressStream,
    bar: Option<&ProgressBar>,
    cancel: F,
) -> bool {
    tokio::pin!(cancel);
    loop {
        tokio::select! {
            event = stream.next() => {
                let Some(event) = event else { return true };
                if let Some(bar) = bar {
                    bar.set_length(event.total_pages as u64);
                    bar.set_position(event.pages_done as u64);
                    if let Some(eta) = event.eta {
                        bar.set_message(format!("~{} left", format_duration(eta)));
                    }
                }
            }
            _ = &mut cancel => return false,
        }
    }
}

/// Print an analysis result for humans.
pub fn print_analysis(result: &AnalysisResult) {
    match result {
        AnalysisResult::Structured(r) => {
            let score = match r.overall_score {
                80..=100 => style(r.overall_score.to_string()).green(),
                50..=79 => style(r.overall_score.to_string()).yellow(),
                _ => style(r.overall_score.to_string()).red(),
            };
            println!(
                "\n{} {}/100 ({})",
                style("Compliance score:").bold(),
                score,
                r.compliance_level
            );
            println!("\n{}\n", r.summary);

            if r.action_items.is_empty() {
                println!("{} No action items", success());
                return;
            }
            println!("{}", style("Action items").bold());
            for item in &r.action_items {
                println!(
                    "  {} [{}] {} {}",
                    style(&item.id).dim(),
                    item.priority,
                    style(&item.title).cyan(),
                    style(format!("({} effort, {})", item.effort, item.timeline)).dim()
                );
                if !item.controls.is_empty() {
                    println!("      {} {}", arrow(), item.controls.join(", "));
                }
            }
        }
        AnalysisResult::RawText(r) => println!("\n{}", r.text),
        AnalysisResult::Fallback(r) => {
            println!("\n{} {}", style("!").yellow(), r.note);
            println!("\n{}", r.raw_text);
        }
    }
}

/// Print a dispatch report for humans.
pub fn print_report(report: &DispatchReport) {
    for record in report.created() {
        println!(
            "{} {} {} {}",
            success(),
            style(&record.key).bold(),
            record.item.title,
            style(&record.url).dim()
        );
    }
    for error in report.errors() {
        println!(
            "{} {} {}",
            failure(),
            error.item.id,
            style(&error.error).red()
        );
    }
    println!(
        "\n{} created, {} failed",
        report.total_created(),
        report.total_errors()
    );
}
