//! Engine dispatch: one request in, one invocation, one result out.
//!
//! No retry and no fallback engine. A failure here is final for the
//! invocation and classifies as [`PipelineError::Engine`].

use std::time::Instant;

use tracing::info;
use uuid::Uuid;

use crate::engine::{ConversionEngine, EngineDocument, EngineOptions, EngineRequest, EngineResult};
use crate::error::PipelineError;
use crate::pipeline::detect::DocumentKind;
use crate::pipeline::input::ResolvedSource;

/// Assemble the engine request and invoke the engine exactly once.
///
/// A staged file is handed over by path; in-memory bytes travel under a
/// synthetic `{uuid}.{ext}` name so the engine still sees the extension.
pub async fn invoke(
    engine: &dyn ConversionEngine,
    resolved: ResolvedSource,
    kind: DocumentKind,
    options: EngineOptions,
) -> Result<EngineResult, PipelineError> {
    let document = match resolved.staged_path() {
        Some(path) => EngineDocument::File(path.to_path_buf()),
        None => EngineDocument::Bytes {
            name: format!("{}.{}", Uuid::new_v4(), kind.extension()),
            data: resolved.into_bytes(),
        },
    };

    let request = EngineRequest {
        document,
        kind,
        options,
    };

    info!(
        "Dispatching {} document to engine '{}' (shape={}, ocr={}, workers={})",
        kind,
        engine.name(),
        options.shape,
        options.image_handling,
        options.workers
    );
    let started = Instant::now();
    let result = engine.convert(&request).await?;
    info!("Engine finished in {:.2}s", started.elapsed().as_secs_f64());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::request::ResponseShape;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CapturingEngine {
        seen: Mutex<Option<EngineRequest>>,
    }

    #[async_trait]
    impl ConversionEngine for CapturingEngine {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn convert(&self, request: &EngineRequest) -> Result<EngineResult, EngineError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok(EngineResult::from_markdown("# ok"))
        }
    }

    struct FailingEngine;

    #[async_trait]
    impl ConversionEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn convert(&self, _request: &EngineRequest) -> Result<EngineResult, EngineError> {
            Err(EngineError::Other("engine exploded".into()))
        }
    }

    fn options() -> EngineOptions {
        EngineOptions {
            shape: ResponseShape::Markdown,
            image_handling: false,
            workers: 2,
        }
    }

    #[tokio::test]
    async fn in_memory_bytes_travel_under_a_synthetic_name() {
        let engine = CapturingEngine {
            seen: Mutex::new(None),
        };
        let resolved = ResolvedSource {
            bytes: b"%PDF-1.7".to_vec(),
            staged: None,
            basename: None,
        };
        invoke(&engine, resolved, DocumentKind::Pdf, options())
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap().take().unwrap();
        match seen.document {
            EngineDocument::Bytes { name, data } => {
                assert!(name.ends_with(".pdf"), "got name: {name}");
                assert!(name.len() > ".pdf".len());
                assert_eq!(data, b"%PDF-1.7");
            }
            other => panic!("expected bytes document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn staged_files_are_handed_over_by_path() {
        let scratch = crate::scratch::Scratch::new(None).unwrap();
        let staged = scratch.stage("report.docx", b"PK\x03\x04").unwrap();
        let engine = CapturingEngine {
            seen: Mutex::new(None),
        };
        let resolved = ResolvedSource {
            bytes: b"PK\x03\x04".to_vec(),
            staged: Some(staged.clone()),
            basename: Some("report.docx".into()),
        };
        invoke(&engine, resolved, DocumentKind::Docx, options())
            .await
            .unwrap();

        let seen = engine.seen.lock().unwrap().take().unwrap();
        match seen.document {
            EngineDocument::File(path) => assert_eq!(path, staged),
            other => panic!("expected file document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn engine_failures_classify_as_engine_errors() {
        let resolved = ResolvedSource {
            bytes: b"%PDF-1.7".to_vec(),
            staged: None,
            basename: None,
        };
        let err = invoke(&FailingEngine, resolved, DocumentKind::Pdf, options())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("engine exploded"), "got: {err}");
    }
}
