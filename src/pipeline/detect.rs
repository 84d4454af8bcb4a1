//! Document format detection.
//!
//! Two independent paths assign a [`DocumentKind`]:
//!
//! * **Extension** ([`DocumentKind::from_key`]) — for object-store keys,
//!   where the extension is known before any bytes move. Event-style
//!   callers screen with this first and skip the fetch entirely when the
//!   kind is unsupported.
//! * **Signature** ([`DocumentKind::from_bytes`]) — for URL-sourced blobs,
//!   which carry no trustworthy name. Magic bytes first, then ZIP
//!   container inspection for the Office/EPUB family, then an HTML sniff.
//!
//! The enumeration is closed. Anything outside it is
//! [`PipelineError::UnsupportedFormat`]; detection never falls back to a
//! default kind and never mutates the bytes it inspects.

use std::fmt;
use std::io::{Cursor, Read};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Bytes of the blob the HTML sniff is willing to look at.
const HTML_SNIFF_BYTES: usize = 512;

/// Leading `<!doctype html` or `<html`, case-insensitive, after optional
/// whitespace.
static HTML_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:<!doctype\s+html|<html)").expect("HTML signature regex is valid")
});

/// Every document format the pipeline will hand to an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
    Pptx,
    Docx,
    Xlsx,
    Html,
    Epub,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 8] = [
        DocumentKind::Pdf,
        DocumentKind::Png,
        DocumentKind::Jpeg,
        DocumentKind::Pptx,
        DocumentKind::Docx,
        DocumentKind::Xlsx,
        DocumentKind::Html,
        DocumentKind::Epub,
    ];

    /// Canonical lowercase extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Png => "png",
            DocumentKind::Jpeg => "jpeg",
            DocumentKind::Pptx => "pptx",
            DocumentKind::Docx => "docx",
            DocumentKind::Xlsx => "xlsx",
            DocumentKind::Html => "html",
            DocumentKind::Epub => "epub",
        }
    }

    /// Exact extension match against the canonical set.
    ///
    /// Case-folded, but no aliasing: "jpg" is not "jpeg" and is rejected.
    pub fn from_extension(ext: &str) -> Option<DocumentKind> {
        let ext = ext.to_ascii_lowercase();
        DocumentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.extension() == ext)
    }

    /// Classify an object key by its final extension.
    ///
    /// Runs before any fetch, so an unsupported upload costs nothing but
    /// this string inspection.
    pub fn from_key(key: &str) -> Result<DocumentKind, PipelineError> {
        let basename = key.rsplit('/').next().unwrap_or(key);
        let ext = match basename.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext,
            _ => {
                return Err(PipelineError::UnsupportedFormat {
                    detail: format!("key '{key}' has no file extension"),
                })
            }
        };
        DocumentKind::from_extension(ext).ok_or_else(|| PipelineError::UnsupportedFormat {
            detail: format!(
                "extension '.{}' is not one of: {}",
                ext.to_ascii_lowercase(),
                supported_extensions()
            ),
        })
    }

    /// Classify a blob by content signature.
    pub fn from_bytes(bytes: &[u8]) -> Result<DocumentKind, PipelineError> {
        if bytes.starts_with(b"%PDF") {
            return Ok(DocumentKind::Pdf);
        }
        if bytes.starts_with(PNG_MAGIC) {
            return Ok(DocumentKind::Png);
        }
        if bytes.starts_with(JPEG_MAGIC) {
            return Ok(DocumentKind::Jpeg);
        }
        if bytes.starts_with(ZIP_MAGIC) {
            return sniff_zip_container(bytes);
        }
        let head = &bytes[..bytes.len().min(HTML_SNIFF_BYTES)];
        if HTML_SIGNATURE.is_match(&String::from_utf8_lossy(head)) {
            return Ok(DocumentKind::Html);
        }
        Err(PipelineError::UnsupportedFormat {
            detail: "no known content signature matched".into(),
        })
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Comma-separated canonical extensions, for error messages.
pub fn supported_extensions() -> String {
    DocumentKind::ALL
        .iter()
        .map(|kind| kind.extension())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Tell the Office formats and EPUB apart by the entries inside the ZIP.
///
/// EPUB is checked first via its `mimetype` entry, which is definitive.
/// The Office formats each carry a well-known root part.
fn sniff_zip_container(bytes: &[u8]) -> Result<DocumentKind, PipelineError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| PipelineError::UnsupportedFormat {
            detail: format!("unreadable ZIP container: {e}"),
        })?;

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut mimetype = String::new();
        if entry.read_to_string(&mut mimetype).is_ok()
            && mimetype.trim() == "application/epub+zip"
        {
            return Ok(DocumentKind::Epub);
        }
    }

    for name in archive.file_names() {
        match name {
            "word/document.xml" => return Ok(DocumentKind::Docx),
            "xl/workbook.xml" => return Ok(DocumentKind::Xlsx),
            "ppt/presentation.xml" => return Ok(DocumentKind::Pptx),
            _ => {}
        }
    }

    Err(PipelineError::UnsupportedFormat {
        detail: "ZIP container without a known document layout".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn zip_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn key_extension_maps_to_a_kind() {
        assert_eq!(
            DocumentKind::from_key("input/report.pdf").unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_key("a/b/slides.PPTX").unwrap(),
            DocumentKind::Pptx
        );
        assert_eq!(
            DocumentKind::from_key("page.html").unwrap(),
            DocumentKind::Html
        );
    }

    #[test]
    fn jpg_alias_is_rejected() {
        let err = DocumentKind::from_key("input/photo.jpg").unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains(".jpg"), "got: {err}");
        assert!(err.to_string().contains("jpeg"), "got: {err}");
    }

    #[test]
    fn key_without_extension_is_rejected() {
        let err = DocumentKind::from_key("input/README").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
        assert!(err.to_string().contains("no file extension"), "got: {err}");
    }

    #[test]
    fn dots_in_directories_do_not_count_as_extensions() {
        let err = DocumentKind::from_key("input.v2/README").unwrap_err();
        assert!(err.to_string().contains("no file extension"), "got: {err}");
    }

    #[test]
    fn magic_bytes_identify_the_binary_kinds() {
        assert_eq!(
            DocumentKind::from_bytes(b"%PDF-1.7 rest").unwrap(),
            DocumentKind::Pdf
        );
        assert_eq!(
            DocumentKind::from_bytes(b"\x89PNG\r\n\x1a\n....").unwrap(),
            DocumentKind::Png
        );
        assert_eq!(
            DocumentKind::from_bytes(b"\xFF\xD8\xFF\xE0....").unwrap(),
            DocumentKind::Jpeg
        );
    }

    #[test]
    fn html_sniff_tolerates_whitespace_and_case() {
        assert_eq!(
            DocumentKind::from_bytes(b"\n  <!DOCTYPE html><html>").unwrap(),
            DocumentKind::Html
        );
        assert_eq!(
            DocumentKind::from_bytes(b"<HTML><body>hi</body>").unwrap(),
            DocumentKind::Html
        );
        // "html" appearing later in a blob is not a signature.
        assert!(DocumentKind::from_bytes(b"hello <html>").is_err());
    }

    #[test]
    fn zip_containers_are_told_apart_by_their_entries() {
        let docx = zip_with_entries(&[("word/document.xml", b"<w/>")]);
        let xlsx = zip_with_entries(&[("xl/workbook.xml", b"<wb/>")]);
        let pptx = zip_with_entries(&[("ppt/presentation.xml", b"<p/>")]);
        let epub = zip_with_entries(&[
            ("mimetype", b"application/epub+zip"),
            ("OEBPS/content.opf", b"<opf/>"),
        ]);
        assert_eq!(DocumentKind::from_bytes(&docx).unwrap(), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_bytes(&xlsx).unwrap(), DocumentKind::Xlsx);
        assert_eq!(DocumentKind::from_bytes(&pptx).unwrap(), DocumentKind::Pptx);
        assert_eq!(DocumentKind::from_bytes(&epub).unwrap(), DocumentKind::Epub);
    }

    #[test]
    fn unknown_zip_layout_is_unsupported_not_defaulted() {
        let plain = zip_with_entries(&[("notes.txt", b"hello")]);
        let err = DocumentKind::from_bytes(&plain).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn truncated_zip_is_unsupported() {
        let err = DocumentKind::from_bytes(b"PK\x03\x04 not a real archive").unwrap_err();
        assert!(err.to_string().contains("ZIP"), "got: {err}");
    }

    #[test]
    fn garbage_matches_nothing() {
        let err = DocumentKind::from_bytes(&[0x00, 0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }
}
