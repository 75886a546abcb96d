//! Media type normalization and PDF resolution.

pub const PDF_MIME: &str = "application/pdf";

/// How a document's media type was resolved to PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaTypeSource {
    /// The declared MIME type named PDF.
    Declared,
    /// The file name carried a `.pdf` extension.
    Extension,
    /// Declared as generic binary, content starts with a PDF signature.
    Signature,
}

impl MediaTypeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declared => "declared",
            Self::Extension => "extension",
            Self::Signature => "signature",
        }
    }
}

/// Lowercase a MIME type and drop any parameters (`; charset=...`).
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Check whether a MIME type names PDF, including legacy aliases.
pub fn is_pdf_mime(mime: &str) -> bool {
    matches!(
        normalize_mime(mime).as_str(),
        "application/pdf" | "application/x-pdf" | "application/acrobat" | "text/pdf"
    )
}

/// Check whether a MIME type is a generic "some bytes" type.
/// A missing or empty type counts as generic; browsers send that for
/// unknown files.
pub fn is_generic_binary(mime: Option<&str>) -> bool {
    match mime.map(normalize_mime) {
        None => true,
        Some(m) => matches!(
            m.as_str(),
            "" | "application/octet-stream"
                | "binary/octet-stream"
                | "application/binary"
                | "application/x-binary"
                | "application/unknown"
        ),
    }
}

/// Resolve a document to PDF using, in order: the declared type, the file
/// name extension, and finally a content signature sniff for generic
/// binary uploads. Returns `None` when none of them match.
pub fn resolve_pdf_media_type(
    declared: Option<&str>,
    file_name: Option<&str>,
    content: &[u8],
) -> Option<MediaTypeSource> {
    if declared.is_some_and(is_pdf_mime) {
        return Some(MediaTypeSource::Declared);
    }

    if file_name.is_some_and(|name| name.to_lowercase().trim_end().ends_with(".pdf")) {
        return Some(MediaTypeSource::Extension);
    }

    if is_generic_binary(declared)
        && infer::get(content).is_some_and(|kind| kind.mime_type() == PDF_MIME)
    {
        return Some(MediaTypeSource::Signature);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PDF_HEAD: &[u8] = b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj";

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("Application/PDF; charset=binary"), "application/pdf");
        assert_eq!(normalize_mime("  text/plain "), "text/plain");
    }

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(
            resolve_pdf_media_type(Some("application/pdf"), Some("notes.txt"), b"hello"),
            Some(MediaTypeSource::Declared)
        );
        assert_eq!(
            resolve_pdf_media_type(Some("application/x-pdf"), None, b""),
            Some(MediaTypeSource::Declared)
        );
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(
            resolve_pdf_media_type(Some("text/plain"), Some("Policy.PDF"), b"hello"),
            Some(MediaTypeSource::Extension)
        );
    }

    #[test]
    fn test_signature_fallback_requires_generic_type() {
        assert_eq!(
            resolve_pdf_media_type(Some("application/octet-stream"), Some("upload"), PDF_HEAD),
            Some(MediaTypeSource::Signature)
        );
        assert_eq!(
            resolve_pdf_media_type(None, None, PDF_HEAD),
            Some(MediaTypeSource::Signature)
        );
        // A specific non-PDF declaration is not overridden by sniffing.
        assert_eq!(
            resolve_pdf_media_type(Some("image/png"), Some("upload"), PDF_HEAD),
            None
        );
    }

    #[test]
    fn test_unrecognized() {
        assert_eq!(
            resolve_pdf_media_type(Some("application/octet-stream"), Some("a.docx"), b"PK\x03\x04"),
            None
        );
    }
}
