//! Shared utility functions.
//!
//! - `mime`: media type normalization and PDF resolution
//! - `format`: human-readable sizes and durations

mod format;
mod mime;

pub use format::{format_duration, format_size};
pub use mime::{
    is_generic_binary, is_pdf_mime, normalize_mime, resolve_pdf_media_type, MediaTypeSource,
    PDF_MIME,
};
