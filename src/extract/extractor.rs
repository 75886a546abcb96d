//! Document extraction: validation, page-by-page text, metadata, preview.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::backend::{PdfBackend, PdfInfo};
use super::error::ExtractionError;
use super::poppler::PopplerBackend;
use super::progress::{ProgressEvent, ProgressSink};
use super::source::SourceDocument;
use crate::utils::{normalize_mime, resolve_pdf_media_type, MediaTypeSource};

/// Separator placed between page texts.
pub const PAGE_SEPARATOR: &str = "\n\n";

pub const DEFAULT_TITLE: &str = "Untitled";
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Extraction limits and optional steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Smallest accepted document, in bytes.
    #[serde(default = "default_min_bytes")]
    pub min_bytes: u64,
    /// Largest accepted document, in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Render a first-page preview image.
    #[serde(default = "default_preview_enabled")]
    pub preview_enabled: bool,
    /// Longest side of the preview, in pixels.
    #[serde(default = "default_preview_max_dimension")]
    pub preview_max_dimension: u32,
}

fn default_min_bytes() -> u64 {
    1024
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_preview_enabled() -> bool {
    true
}

fn default_preview_max_dimension() -> u32 {
    480
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_bytes: default_min_bytes(),
            max_bytes: default_max_bytes(),
            preview_enabled: default_preview_enabled(),
            preview_max_dimension: default_preview_max_dimension(),
        }
    }
}

impl ExtractionConfig {
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Descriptive metadata. Always present; missing values use defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub page_count: u32,
    pub byte_size: u64,
}

impl DocumentMetadata {
    fn from_info(info: PdfInfo, page_count: u32, byte_size: u64) -> Self {
        Self {
            title: info
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            author: info
                .author
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            creation_date: info.creation_date,
            modification_date: info.modification_date,
            page_count,
            byte_size,
        }
    }
}

/// A rendered page image at reduced scale.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub page: u32,
    pub mime_type: &'static str,
    pub data: Vec<u8>,
}

impl PreviewImage {
    /// Encode as a `data:` URL for embedding.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

/// Result of extracting one source document. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pages: Vec<String>,
    metadata: DocumentMetadata,
    preview: Option<PreviewImage>,
    media_source: MediaTypeSource,
}

impl ExtractedDocument {
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All page texts joined with `PAGE_SEPARATOR`.
    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// Number of non-whitespace characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages
            .iter()
            .map(|p| p.chars().filter(|c| !c.is_whitespace()).count())
            .sum()
    }

    /// Valid but contains no text (e.g. a scanned document).
    pub fn is_empty(&self) -> bool {
        self.char_count() == 0
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    pub fn media_source(&self) -> MediaTypeSource {
        self.media_source
    }
}

/// Turns a `SourceDocument` into an `ExtractedDocument`.
///
/// Cheap to clone; each `extract` call keeps its own progress and staging
/// state, so concurrent extractions don't interfere.
#[derive(Clone)]
pub struct DocumentExtractor {
    backend: Arc<dyn PdfBackend>,
    config: ExtractionConfig,
}

impl DocumentExtractor {
    pub fn new(backend: Arc<dyn PdfBackend>, config: ExtractionConfig) -> Self {
        Self { backend, config }
    }

    /// Extractor backed by poppler-utils.
    pub fn poppler(config: ExtractionConfig) -> Self {
        Self::new(Arc::new(PopplerBackend::new()), config)
    }

    pub fn backend(&self) -> &dyn PdfBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Check type and size bounds. No extraction work happens before this
    /// passes.
    pub fn validate(&self, doc: &SourceDocument) -> Result<MediaTypeSource, ExtractionError> {
        let media_source =
            resolve_pdf_media_type(doc.declared_type(), doc.file_name(), doc.content())
                .ok_or_else(|| {
                    ExtractionError::UnsupportedType(
                        doc.declared_type()
                            .map(normalize_mime)
                            .filter(|m| !m.is_empty())
                            .unwrap_or_else(|| "unknown".to_string()),
                    )
                })?;

        let size = doc.size();
        if size < self.config.min_bytes {
            return Err(ExtractionError::TooSmall {
                size,
                min: self.config.min_bytes,
            });
        }
        if size > self.config.max_bytes {
            return Err(ExtractionError::TooLarge {
                size,
                max: self.config.max_bytes,
            });
        }

        Ok(media_source)
    }

    /// Extract text, metadata and preview, reporting progress after each page.
    pub async fn extract(
        &self,
        doc: &SourceDocument,
        progress: &ProgressSink,
    ) -> Result<ExtractedDocument, ExtractionError> {
        let media_source = self.validate(doc)?;
        debug!(
            "Document accepted as PDF via {} ({} bytes)",
            media_source.as_str(),
            doc.size()
        );

        let temp_dir = TempDir::new()?;
        let staged = temp_dir.path().join("document.pdf");
        tokio::fs::write(&staged, doc.content()).await?;

        let pages = self.extract_pages(&staged, progress).await?;
        let page_count = pages.len() as u32;

        let (info, preview) = tokio::join!(self.read_metadata(&staged), self.read_preview(&staged));

        let extracted = ExtractedDocument {
            pages,
            metadata: DocumentMetadata::from_info(info, page_count, doc.size()),
            preview,
            media_source,
        };

        if extracted.is_empty() {
            warn!(
                "Extracted no text from {} page(s); document may be image-only",
                page_count
            );
        } else {
            info!(
                "Extracted {} characters from {} page(s)",
                extracted.char_count(),
                page_count
            );
        }

        Ok(extracted)
    }

    async fn extract_pages(
        &self,
        path: &Path,
        progress: &ProgressSink,
    ) -> Result<Vec<String>, ExtractionError> {
        let total = self
            .backend
            .page_count(path)
            .await
            .map_err(|e| ExtractionError::CorruptOrEncrypted(e.to_string()))?;
        if total == 0 {
            return Err(ExtractionError::CorruptOrEncrypted(
                "document has no pages".to_string(),
            ));
        }

        let started = Instant::now();
        let mut pages = Vec::with_capacity(total as usize);

        for page in 1..=total {
            let text = self.backend.page_text(path, page).await.map_err(|e| {
                ExtractionError::CorruptOrEncrypted(format!("page {}: {}", page, e))
            })?;
            pages.push(text);

            let event = ProgressEvent::new(page, total, started.elapsed());
            if !progress.emit(event) {
                debug!("Progress for page {}/{} not delivered", page, total);
            }
        }

        Ok(pages)
    }

    async fn read_metadata(&self, path: &Path) -> PdfInfo {
        match self.backend.metadata(path).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Metadata extraction failed, using defaults: {}", e);
                PdfInfo::default()
            }
        }
    }

    async fn read_preview(&self, path: &Path) -> Option<PreviewImage> {
        if !self.config.preview_enabled {
            return None;
        }
        match self
            .backend
            .render_preview(path, 1, self.config.preview_max_dimension)
            .await
        {
            Ok(data) if !data.is_empty() => Some(PreviewImage {
                page: 1,
                mime_type: "image/png",
                data,
            }),
            Ok(_) => {
                warn!("Preview rendering produced no image");
                None
            }
            Err(e) => {
                warn!("Preview rendering failed: {}", e);
                None
            }
        }
    }
}
