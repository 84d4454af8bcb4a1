//! Conversion engine seam.
//!
//! The pipeline never converts documents itself. It builds an
//! [`EngineRequest`] from the resolved source and hands it to whatever
//! [`ConversionEngine`] it was constructed with; everything after the
//! seam — OCR, layout analysis, rendering — is the engine's problem.
//!
//! ## Why a trait
//!
//! The production deployment talks to a sidecar process over HTTP
//! ([`HttpEngine`]), but tests want an in-process fake and embedders may
//! link an engine directly. One `async` trait keeps the pipeline oblivious
//! to the difference.

pub mod http;

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::EngineError;
use crate::pipeline::detect::DocumentKind;
use crate::request::ResponseShape;

pub use http::HttpEngine;

/// The document handed to the engine.
#[derive(Debug, Clone)]
pub enum EngineDocument {
    /// In-memory bytes under a synthetic name carrying the extension.
    Bytes { name: String, data: Vec<u8> },
    /// A file staged on local disk.
    File(PathBuf),
}

impl EngineDocument {
    /// File name the engine should see for this document.
    pub fn file_name(&self) -> String {
        match self {
            EngineDocument::Bytes { name, .. } => name.clone(),
            EngineDocument::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string()),
        }
    }
}

/// Conversion knobs, resolved from the request and the pipeline config.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub shape: ResponseShape,
    /// Run image recognition (OCR) passes over page images.
    pub image_handling: bool,
    /// Worker hint for the engine's internal parallelism.
    pub workers: usize,
}

/// One conversion call.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub document: EngineDocument,
    pub kind: DocumentKind,
    pub options: EngineOptions,
}

/// What an engine hands back.
///
/// Either accessor may be empty; the packaging stage decides whether the
/// result satisfies the requested shape.
#[derive(Debug, Clone, Default)]
pub struct EngineResult {
    markdown: Option<String>,
    structured: Option<Map<String, Value>>,
}

impl EngineResult {
    pub fn new(markdown: Option<String>, structured: Option<Map<String, Value>>) -> Self {
        Self {
            markdown,
            structured,
        }
    }

    pub fn from_markdown(text: impl Into<String>) -> Self {
        Self {
            markdown: Some(text.into()),
            structured: None,
        }
    }

    pub fn from_structured(map: Map<String, Value>) -> Self {
        Self {
            markdown: None,
            structured: Some(map),
        }
    }

    pub fn markdown(&self) -> Option<&str> {
        self.markdown.as_deref()
    }

    pub fn structured(&self) -> Option<&Map<String, Value>> {
        self.structured.as_ref()
    }

    pub fn into_markdown(self) -> Option<String> {
        self.markdown
    }

    pub fn into_structured(self) -> Option<Map<String, Value>> {
        self.structured
    }
}

/// A document conversion backend.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Short implementation name, for logs.
    fn name(&self) -> &str;

    /// Convert one document.
    ///
    /// Called at most once per pipeline invocation — retries, if any,
    /// belong to the host runtime. Implementations should not impose their
    /// own deadline; the caller does.
    async fn convert(&self, request: &EngineRequest) -> Result<EngineResult, EngineError>;
}
