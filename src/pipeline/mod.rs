//! Pipeline stages for document ingestion and conversion.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (e.g. a different engine transport) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ detect ──▶ dispatch ──▶ package ──▶ deliver
//! (URL/store) (kind)   (engine)     (shape)     (inline/store)
//! ```
//!
//! 1. [`input`]    — resolve the source to bytes; stage store objects to a
//!    scratch file
//! 2. [`detect`]   — assign a [`detect::DocumentKind`]; object keys are
//!    screened by extension before any bytes move
//! 3. [`dispatch`] — exactly one engine invocation, the dominant cost
//! 4. [`package`]  — enforce the requested shape on the engine result
//! 5. [`deliver`]  — hand the payload back inline, or write it to storage
//!    at the derived key
//!
//! [`Pipeline::run`] wires the stages together. A [`Scratch`] spans the
//! whole invocation, so temp files are released on every exit path.

pub mod deliver;
pub mod detect;
pub mod dispatch;
pub mod input;
pub mod package;

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::PipelineConfig;
use crate::engine::{ConversionEngine, EngineOptions};
use crate::error::PipelineError;
use crate::outcome::{ConversionOutcome, OutcomeMetadata, StageTimings};
use crate::request::{ConversionRequest, Source};
use crate::scratch::Scratch;
use crate::store::ObjectStore;
use detect::DocumentKind;

/// How the converted payload leaves the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Return the payload in the outcome only.
    Inline,
    /// Additionally upload the payload to the source's bucket at the
    /// derived output key.
    WriteBack,
}

/// The conversion pipeline: engine, optional store, config.
///
/// Stateless across invocations: every [`Pipeline::run`] call resolves,
/// detects, converts and delivers from scratch. Clone-cheap handles make
/// it trivial to share behind an `Arc` in a server.
pub struct Pipeline {
    engine: Arc<dyn ConversionEngine>,
    store: Option<Arc<dyn ObjectStore>>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(engine: Arc<dyn ConversionEngine>, config: PipelineConfig) -> Self {
        Self {
            engine,
            store: None,
            config,
        }
    }

    /// Attach an object store. Required for [`Source::ObjectRef`] inputs
    /// and for [`DeliveryMode::WriteBack`].
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one conversion end to end.
    ///
    /// Exactly one attempt per stage; every failure is classified. The
    /// caller decides what a failure means; there is no retry here.
    pub async fn run(
        &self,
        request: &ConversionRequest,
        delivery: DeliveryMode,
    ) -> Result<ConversionOutcome, PipelineError> {
        let total = Instant::now();
        let mut timings = StageTimings::default();

        // Write-back needs a bucket to land in; URL sources have none.
        let write_back_target = match (delivery, request.source()) {
            (DeliveryMode::WriteBack, Source::ObjectRef { bucket, key }) => {
                Some((bucket.clone(), key.clone()))
            }
            (DeliveryMode::WriteBack, Source::RemoteUrl(_)) => {
                return Err(PipelineError::Processing(
                    "write-back delivery requires an object source".into(),
                ));
            }
            (DeliveryMode::Inline, _) => None,
        };

        // ── Pre-fetch screening ──────────────────────────────────────────
        // Object keys carry an extension; unsupported kinds are rejected
        // before a single byte moves.
        let declared = match request.source() {
            Source::ObjectRef { key, .. } => Some(DocumentKind::from_key(key)?),
            Source::RemoteUrl(_) => None,
        };

        let scratch = Scratch::new(self.config.scratch_root.as_deref())
            .map_err(|e| PipelineError::Processing(format!("cannot create scratch space: {e}")))?;

        // ── Stage 1: resolve ─────────────────────────────────────────────
        let stage = Instant::now();
        let resolved = input::resolve(
            request.source(),
            self.store.as_deref(),
            &scratch,
            self.config.download_timeout_secs,
        )
        .await?;
        timings.resolve_ms = stage.elapsed().as_millis() as u64;
        let source_bytes = resolved.len() as u64;

        // ── Stage 2: detect ──────────────────────────────────────────────
        let stage = Instant::now();
        let kind = match declared {
            Some(kind) => kind,
            None => DocumentKind::from_bytes(resolved.bytes())?,
        };
        timings.detect_ms = stage.elapsed().as_millis() as u64;
        info!("Detected document kind: {}", kind);

        // ── Stage 3: dispatch ────────────────────────────────────────────
        let options = EngineOptions {
            shape: request.response_shape(),
            image_handling: request.image_handling(),
            workers: self.config.engine_workers,
        };
        let stage = Instant::now();
        let result = dispatch::invoke(self.engine.as_ref(), resolved, kind, options).await?;
        timings.convert_ms = stage.elapsed().as_millis() as u64;

        // ── Stage 4: package ─────────────────────────────────────────────
        let payload = package::package(result, request.response_shape())?;

        // ── Stage 5: deliver ─────────────────────────────────────────────
        let stage = Instant::now();
        let stored_at = match &write_back_target {
            None => None,
            Some((bucket, key)) => {
                let store = self.store.as_deref().ok_or_else(|| {
                    PipelineError::Processing(
                        "no object store configured for write-back delivery".into(),
                    )
                })?;
                Some(deliver::write_back(store, bucket, key, &payload, &scratch).await?)
            }
        };
        timings.deliver_ms = stage.elapsed().as_millis() as u64;

        timings.total_ms = total.elapsed().as_millis() as u64;
        info!(
            "Pipeline finished in {}ms ({} document, {} bytes in)",
            timings.total_ms, kind, source_bytes
        );

        Ok(ConversionOutcome {
            payload,
            stored_at,
            metadata: OutcomeMetadata {
                kind,
                source_bytes,
                timings,
            },
        })
    }
}
