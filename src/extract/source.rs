//! Uploaded source documents.

use std::path::Path;

/// A document as selected by the user: raw bytes plus whatever the upload
/// told us about its type. Never persisted.
#[derive(Clone)]
pub struct SourceDocument {
    content: Vec<u8>,
    declared_type: Option<String>,
    file_name: Option<String>,
}

impl SourceDocument {
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            declared_type: None,
            file_name: None,
        }
    }

    /// Set the MIME type declared by the uploader.
    pub fn with_declared_type(mut self, mime: impl Into<String>) -> Self {
        self.declared_type = Some(mime.into());
        self
    }

    /// Set the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Load a document from disk. The declared type is left unset so the
    /// extension and signature checks decide.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let mut doc = Self::new(content);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            doc = doc.with_file_name(name);
        }
        Ok(doc)
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn declared_type(&self) -> Option<&str> {
        self.declared_type.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

impl std::fmt::Debug for SourceDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDocument")
            .field("size", &self.content.len())
            .field("declared_type", &self.declared_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}
