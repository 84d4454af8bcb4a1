//! Conversion request types: what to convert, from where, into what shape.
//!
//! A [`ConversionRequest`] is immutable once built — the pipeline stages all
//! borrow it, and none of them may change what the caller asked for.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters of a remote URL that may appear in logs and error text.
///
/// Presigned URLs embed credentials in their query string; everything past
/// this prefix is dropped from any diagnostic output.
pub(crate) const URL_LOG_PREFIX_CHARS: usize = 20;

/// Truncate a URL to its loggable prefix.
pub(crate) fn redact_url(url: &str) -> String {
    let mut prefix: String = url.chars().take(URL_LOG_PREFIX_CHARS).collect();
    if url.chars().count() > URL_LOG_PREFIX_CHARS {
        prefix.push_str("...");
    }
    prefix
}

/// Where the document lives.
#[derive(Clone, PartialEq, Eq)]
pub enum Source {
    /// A presigned or public HTTP(S) URL. Treated as a bearer credential.
    RemoteUrl(String),
    /// An object in durable storage.
    ObjectRef { bucket: String, key: String },
}

// Hand-written so the URL is never printed whole, not even at Debug level.
impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::RemoteUrl(url) => {
                f.debug_tuple("RemoteUrl").field(&redact_url(url)).finish()
            }
            Source::ObjectRef { bucket, key } => f
                .debug_struct("ObjectRef")
                .field("bucket", bucket)
                .field("key", key)
                .finish(),
        }
    }
}

/// The shape the caller wants the conversion result in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseShape {
    /// Markdown text.
    Markdown,
    /// Structured document mapping (lossless engine output).
    Structured,
}

impl ResponseShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseShape::Markdown => "markdown",
            ResponseShape::Structured => "structured",
        }
    }
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single conversion invocation's input.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    source: Source,
    image_handling: bool,
    response_shape: ResponseShape,
}

impl ConversionRequest {
    pub fn new(source: Source, image_handling: bool, response_shape: ResponseShape) -> Self {
        Self {
            source,
            image_handling,
            response_shape,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Whether the engine should run image recognition (OCR) passes.
    pub fn image_handling(&self) -> bool {
        self.image_handling
    }

    pub fn response_shape(&self) -> ResponseShape {
        self.response_shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_urls_pass_through_unredacted() {
        assert_eq!(redact_url("https://x.io/a"), "https://x.io/a");
    }

    #[test]
    fn long_urls_are_cut_to_the_prefix() {
        let url = "https://bucket.example.com/doc.pdf?X-Credential=secret";
        let redacted = redact_url(url);
        assert_eq!(redacted, "https://bucket.examp...");
        assert!(!redacted.contains("secret"));
    }

    #[test]
    fn source_debug_never_prints_the_whole_url() {
        let source = Source::RemoteUrl(
            "https://bucket.example.com/doc.pdf?X-Credential=topsecret".into(),
        );
        let printed = format!("{source:?}");
        assert!(!printed.contains("topsecret"), "got: {printed}");
    }

    #[test]
    fn request_is_read_only_after_construction() {
        let req = ConversionRequest::new(
            Source::ObjectRef {
                bucket: "docs".into(),
                key: "input/a.pdf".into(),
            },
            true,
            ResponseShape::Structured,
        );
        assert!(req.image_handling());
        assert_eq!(req.response_shape(), ResponseShape::Structured);
        match req.source() {
            Source::ObjectRef { bucket, key } => {
                assert_eq!(bucket, "docs");
                assert_eq!(key, "input/a.pdf");
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }
}
