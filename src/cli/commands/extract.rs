//! Text extraction command.

use std::path::Path;

use console::style;
use serde::Serialize;

use crate::config::Config;
use crate::extract::{DocumentMetadata, SourceDocument};
use crate::pipeline::PolicyPipeline;
use crate::utils::format_size;

use crate::cli::helpers::{arrow, extract_with_progress, success};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractionOutput<'a> {
    metadata: &'a DocumentMetadata,
    media_type_source: &'static str,
    char_count: usize,
    pages: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    preview: Option<String>,
}

/// Extract a PDF and print its text and metadata.
pub async fn cmd_extract(
    config: &Config,
    file: &Path,
    mime: Option<&str>,
    json: bool,
    preview_path: Option<&Path>,
) -> anyhow::Result<()> {
    let mut document = SourceDocument::from_path(file).await?;
    if let Some(mime) = mime {
        document = document.with_declared_type(mime);
    }

    let pipeline = PolicyPipeline::from_config(config, None)?;
    let extracted = extract_with_progress(&pipeline, document, !json).await?;

    if let (Some(path), Some(preview)) = (preview_path, extracted.preview()) {
        tokio::fs::write(path, &preview.data).await?;
        if !json {
            println!("{} Preview written to {}", success(), path.display());
        }
    }

    if json {
        let output = ExtractionOutput {
            metadata: extracted.metadata(),
            media_type_source: extracted.media_source().as_str(),
            char_count: extracted.char_count(),
            pages: extracted.pages(),
            preview: extracted.preview().map(|p| p.to_data_url()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let meta = extracted.metadata();
    println!("\n{}", style(&meta.title).bold());
    println!("  {} Author: {}", arrow(), meta.author);
    if let Some(created) = meta.creation_date {
        println!("  {} Created: {}", arrow(), created.format("%Y-%m-%d"));
    }
    if let Some(modified) = meta.modification_date {
        println!("  {} Modified: {}", arrow(), modified.format("%Y-%m-%d"));
    }
    println!(
        "  {} {} page(s), {}, {} characters",
        arrow(),
        meta.page_count,
        format_size(meta.byte_size),
        extracted.char_count()
    );

    if extracted.is_empty() {
        println!(
            "\n{} No text found. The PDF may be a scan without a text layer.",
            style("!").yellow()
        );
    } else {
        println!("\n{}", extracted.text());
    }

    Ok(())
}
