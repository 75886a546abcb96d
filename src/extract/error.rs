//! Extraction error types.

use thiserror::Error;

use crate::utils::format_size;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("Document too small: {size} bytes (minimum {min})")]
    TooSmall { size: u64, min: u64 },

    #[error("Document too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Document is corrupt or encrypted: {0}")]
    CorruptOrEncrypted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Message suitable for showing to the person who uploaded the document.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedType(found) => format!(
                "Only PDF documents are supported (got {}). Export the policy as PDF and try again.",
                found
            ),
            Self::TooSmall { size, .. } => format!(
                "This file is only {} and does not look like a real document.",
                format_size(*size)
            ),
            Self::TooLarge { size, max } => format!(
                "This file is {}; the limit is {}. Split or compress the document.",
                format_size(*size),
                format_size(*max)
            ),
            Self::CorruptOrEncrypted(_) => {
                "The PDF could not be read. It may be damaged or password protected.".to_string()
            }
            Self::Io(_) => "The document could not be staged for extraction.".to_string(),
        }
    }
}
