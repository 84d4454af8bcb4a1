//! # docingest
//!
//! Ingest a document from a URL or object storage, convert it through a
//! pluggable engine, and deliver Markdown or structured output.
//!
//! ## Why this crate?
//!
//! Document conversion keeps growing the same scaffolding around every
//! engine: fetch the bytes safely, figure out what they are, call the
//! engine once, enforce the shape the caller asked for, put the result
//! where it belongs, and clean up. This crate is that scaffolding, done
//! once — stateless per invocation, with every failure classified into a
//! stable status code and temp files released on every exit path.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Resolve   fetch from URL or object store (one attempt, no retry)
//!  ├─ 2. Detect    extension screen for keys, content signature for blobs
//!  ├─ 3. Dispatch  exactly one engine invocation (the dominant cost)
//!  ├─ 4. Package   markdown or structured mapping, verbatim
//!  └─ 5. Deliver   inline, or written back at the derived `output/*.md` key
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docingest::{
//!     ConversionRequest, DeliveryMode, HttpEngine, Pipeline, PipelineConfig,
//!     ResponseShape, Source,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(HttpEngine::new("http://localhost:3001"));
//!     let pipeline = Pipeline::new(engine, PipelineConfig::default());
//!
//!     let request = ConversionRequest::new(
//!         Source::RemoteUrl("https://example.com/report.pdf".into()),
//!         false,
//!         ResponseShape::Markdown,
//!     );
//!     let outcome = pipeline.run(&request, DeliveryMode::Inline).await?;
//!     if let Some(markdown) = outcome.payload.as_markdown() {
//!         println!("{markdown}");
//!     }
//!     eprintln!(
//!         "{} bytes in, {} ms total",
//!         outcome.metadata.source_bytes, outcome.metadata.timings.total_ms
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docingest` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docingest = { version = "0.1", default-features = false }
//! ```
//!
//! ## Supported formats
//!
//! pdf, png, jpeg, pptx, docx, xlsx, html, epub — a closed set. Unknown
//! inputs fail with `UnsupportedFormat` (400); nothing is ever defaulted.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod outcome;
pub mod pipeline;
pub mod request;
pub mod scratch;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use engine::{
    ConversionEngine, EngineDocument, EngineOptions, EngineRequest, EngineResult, HttpEngine,
};
pub use error::{EngineError, PipelineError, StoreError};
pub use handler::{
    handle_event, handle_sync, EventBody, EventResponse, StorageEvent, SyncBody, SyncEvent,
    SyncResponse,
};
pub use outcome::{ConversionOutcome, OutcomeMetadata, Payload, StageTimings};
pub use pipeline::detect::DocumentKind;
pub use pipeline::{DeliveryMode, Pipeline};
pub use request::{ConversionRequest, ResponseShape, Source};
pub use scratch::Scratch;
pub use store::{FsObjectStore, ObjectStore};
