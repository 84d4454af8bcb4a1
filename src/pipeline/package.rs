//! Result packaging: enforce the requested shape, verbatim.

use crate::engine::EngineResult;
use crate::error::PipelineError;
use crate::outcome::Payload;
use crate::request::ResponseShape;

/// Pull the requested shape out of the engine result.
///
/// The payload is passed through untouched — no trimming, no re-encoding.
/// A result that lacks the requested shape is a packaging failure; the
/// other shape being present does not rescue it.
pub fn package(result: EngineResult, requested: ResponseShape) -> Result<Payload, PipelineError> {
    match requested {
        ResponseShape::Markdown => {
            result
                .into_markdown()
                .map(Payload::Markdown)
                .ok_or_else(|| PipelineError::Packaging {
                    requested,
                    detail: "engine result carries no markdown".into(),
                })
        }
        ResponseShape::Structured => {
            result
                .into_structured()
                .map(Payload::Structured)
                .ok_or_else(|| PipelineError::Packaging {
                    requested,
                    detail: "engine result carries no structured mapping".into(),
                })
        }
    }
}
