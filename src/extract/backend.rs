//! PDF backend abstraction.
//!
//! The extractor only talks to a `PdfBackend`. Poppler's command-line tools
//! are the default implementation; tests and alternative engines plug in
//! their own.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from PDF backends.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("{0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document information as reported by the backend. Every field is
/// optional; the extractor fills in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub modification_date: Option<DateTime<Utc>>,
    pub pages: Option<u32>,
    pub encrypted: bool,
}

#[async_trait]
pub trait PdfBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Check if this backend can run (binaries installed, etc).
    fn is_available(&self) -> bool;

    /// What to install to make the backend available.
    fn availability_hint(&self) -> String;

    /// Number of pages in the document.
    async fn page_count(&self, path: &Path) -> Result<u32, BackendError>;

    /// Text of a single page (1-based).
    async fn page_text(&self, path: &Path, page: u32) -> Result<String, BackendError>;

    /// Descriptive metadata.
    async fn metadata(&self, path: &Path) -> Result<PdfInfo, BackendError>;

    /// Render one page (1-based) to PNG, longest side at most `max_dimension`.
    async fn render_preview(
        &self,
        path: &Path,
        page: u32,
        max_dimension: u32,
    ) -> Result<Vec<u8>, BackendError>;
}
