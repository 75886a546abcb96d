//! Document extraction.
//!
//! Converts an uploaded PDF into page texts, a metadata record and an
//! optional first-page preview. Text extraction is the only mandatory step;
//! metadata and preview each degrade to defaults on failure.
//!
//! Progress is reported per page through a `ProgressStream` created with
//! [`progress_channel`].

mod backend;
mod error;
mod extractor;
mod poppler;
mod progress;
mod source;

pub use backend::{BackendError, PdfBackend, PdfInfo};
pub use error::ExtractionError;
pub use extractor::{
    DocumentExtractor, DocumentMetadata, ExtractedDocument, ExtractionConfig, PreviewImage,
    DEFAULT_AUTHOR, DEFAULT_TITLE, PAGE_SEPARATOR,
};
pub use poppler::{parse_pdfinfo, PopplerBackend};
pub use progress::{progress_channel, Liveness, ProgressEvent, ProgressSink, ProgressStream};
pub use source::SourceDocument;
