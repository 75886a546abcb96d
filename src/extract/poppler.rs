//! Poppler command-line backend (pdfinfo, pdftotext, pdftoppm).

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tempfile::TempDir;
use tokio::process::Command;

use super::backend::{BackendError, PdfBackend, PdfInfo};

const POPPLER_HINT: &str = "install poppler-utils";
const REQUIRED_TOOLS: [&str; 3] = ["pdfinfo", "pdftotext", "pdftoppm"];

/// Handle command output, extracting stdout on success or returning appropriate error.
fn handle_cmd_output(
    result: std::io::Result<std::process::Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, BackendError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(BackendError::Failed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(BackendError::ToolNotFound(
            format!("{} ({})", tool_name, POPPLER_HINT),
        )),
        Err(e) => Err(BackendError::Io(e)),
    }
}

/// Parse a pdfinfo date. `-isodates` output is RFC 3339; older poppler
/// builds print `Mon Jan 15 10:30:00 2024 UTC`.
fn parse_pdfinfo_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let without_zone = match value.rsplit_once(' ') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_alphabetic()) => head,
        _ => value,
    };
    NaiveDateTime::parse_from_str(without_zone.trim(), "%a %b %e %H:%M:%S %Y")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse `pdfinfo` output into a `PdfInfo`.
pub fn parse_pdfinfo(stdout: &str) -> PdfInfo {
    let mut info = PdfInfo::default();

    for line in stdout.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "Title" => info.title = Some(value.to_string()),
            "Author" => info.author = Some(value.to_string()),
            "CreationDate" => info.creation_date = parse_pdfinfo_date(value),
            "ModDate" => info.modification_date = parse_pdfinfo_date(value),
            "Pages" => info.pages = value.parse().ok(),
            "Encrypted" => info.encrypted = value.starts_with("yes"),
            _ => {}
        }
    }

    info
}

/// PDF backend that shells out to poppler-utils.
#[derive(Debug, Clone, Default)]
pub struct PopplerBackend;

impl PopplerBackend {
    pub fn new() -> Self {
        Self
    }

    /// Check which poppler tools are on PATH.
    pub fn check_tools() -> Vec<(String, bool)> {
        REQUIRED_TOOLS
            .iter()
            .map(|tool| (tool.to_string(), which::which(tool).is_ok()))
            .collect()
    }

    async fn run_pdfinfo(&self, path: &Path) -> Result<String, BackendError> {
        let output = Command::new("pdfinfo")
            .arg("-isodates")
            .arg(path)
            .output()
            .await;
        handle_cmd_output(output, "pdfinfo", "pdfinfo failed")
    }
}

#[async_trait]
impl PdfBackend for PopplerBackend {
    fn name(&self) -> &'static str {
        "poppler"
    }

    fn is_available(&self) -> bool {
        Self::check_tools().iter().all(|(_, found)| *found)
    }

    fn availability_hint(&self) -> String {
        format!("pdfinfo, pdftotext, pdftoppm: {}", POPPLER_HINT)
    }

    async fn page_count(&self, path: &Path) -> Result<u32, BackendError> {
        let stdout = self.run_pdfinfo(path).await?;
        parse_pdfinfo(&stdout)
            .pages
            .ok_or_else(|| BackendError::Failed("pdfinfo reported no page count".to_string()))
    }

    async fn page_text(&self, path: &Path, page: u32) -> Result<String, BackendError> {
        let page_str = page.to_string();
        let output = Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8", "-f", &page_str, "-l", &page_str])
            .arg(path)
            .arg("-") // Output to stdout
            .output()
            .await;

        let text = handle_cmd_output(
            output,
            "pdftotext",
            &format!("pdftotext failed on page {}", page),
        )?;
        // pdftotext terminates every page with a form feed.
        Ok(text.trim_end_matches('\u{c}').to_string())
    }

    async fn metadata(&self, path: &Path) -> Result<PdfInfo, BackendError> {
        let stdout = self.run_pdfinfo(path).await?;
        Ok(parse_pdfinfo(&stdout))
    }

    async fn render_preview(
        &self,
        path: &Path,
        page: u32,
        max_dimension: u32,
    ) -> Result<Vec<u8>, BackendError> {
        let temp_dir = TempDir::new()?;
        let prefix = temp_dir.path().join("preview");
        let page_str = page.to_string();
        let scale = max_dimension.to_string();

        let output = Command::new("pdftoppm")
            .args(["-png", "-singlefile", "-f", &page_str, "-l", &page_str])
            .args(["-scale-to", &scale])
            .arg(path)
            .arg(&prefix)
            .output()
            .await;
        handle_cmd_output(
            output,
            "pdftoppm",
            &format!("pdftoppm failed to render page {}", page),
        )?;

        // -singlefile writes exactly `<prefix>.png`
        let image_path = prefix.with_extension("png");
        Ok(tokio::fs::read(&image_path).await?)
    }
}
