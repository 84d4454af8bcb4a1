//! Error types for the docingest library.
//!
//! Three error types reflect three layers of the system:
//!
//! * [`PipelineError`] — the classified outcome of a failed invocation.
//!   Every failure inside the pipeline maps to exactly one variant, and
//!   every variant carries a stable HTTP-equivalent status code via
//!   [`PipelineError::status_code`]. Returned as `Err(PipelineError)` from
//!   [`crate::Pipeline::run`] and surfaced verbatim in handler responses.
//!
//! * [`EngineError`] — raised by a [`crate::engine::ConversionEngine`]
//!   implementation. The dispatcher folds it into
//!   [`PipelineError::Engine`]; it never crosses the pipeline boundary.
//!
//! * [`StoreError`] — raised by an [`crate::store::ObjectStore`]
//!   implementation. Mapped by the stage that observed it: a failed `get`
//!   is a fetch problem, a failed `put` is an internal one.
//!
//! Classification is total and deliberately flat: callers match on the
//! category or call `status_code()`, nothing more. Retries, if any, belong
//! to the host runtime, not here.

use thiserror::Error;

use crate::request::ResponseShape;

/// A failed pipeline invocation, classified into one outcome category.
///
/// Categories are mutually exclusive; no failure maps to more than one.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// The document source could not be retrieved: unreachable host,
    /// non-success upstream status, empty body, or a miss in object storage.
    #[error("Error fetching document: {reason}")]
    Fetch { reason: String },

    /// The document's extension or content signature is outside the
    /// supported set. Never produced as a fallback for some other fault.
    #[error("Unsupported document format: {detail}")]
    UnsupportedFormat { detail: String },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// The conversion engine was reached but failed the invocation.
    #[error("Conversion engine failed: {message}")]
    Engine { message: String },

    /// The engine produced a result, but not in the requested shape.
    #[error("Cannot package result as {requested}: {detail}")]
    Packaging {
        requested: ResponseShape,
        detail: String,
    },

    /// The caller-imposed deadline elapsed before the pipeline finished.
    /// The engine call has no timeout of its own; this is the only bound.
    #[error("Conversion timed out after {secs}s")]
    Timeout { secs: u64 },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Internal fault: scratch I/O, write-back upload, configuration.
    #[error("Processing error: {0}")]
    Processing(String),
}

impl PipelineError {
    /// HTTP-equivalent status code for this category.
    ///
    /// Stable across releases; handler responses and the CLI exit path
    /// both rely on it.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Fetch { .. } => 502,
            PipelineError::UnsupportedFormat { .. } => 400,
            PipelineError::Engine { .. } => 500,
            PipelineError::Packaging { .. } => 500,
            PipelineError::Timeout { .. } => 504,
            PipelineError::Processing(_) => 500,
        }
    }
}

impl From<EngineError> for PipelineError {
    fn from(e: EngineError) -> Self {
        PipelineError::Engine {
            message: e.to_string(),
        }
    }
}

/// A failure reported by a conversion engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine endpoint answered with a non-success status.
    #[error("engine returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The engine answered, but the response could not be decoded.
    #[error("engine response could not be decoded: {0}")]
    Decode(String),

    /// Transport-level failure before any engine response arrived.
    #[error("engine unreachable: {0}")]
    Transport(String),

    /// Anything else an implementation needs to report.
    #[error("{0}")]
    Other(String),
}

/// A failure reported by an object store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No object at the given location.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The store refused access to the object.
    #[error("access denied: {bucket}/{key}")]
    AccessDenied { bucket: String, key: String },

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_category_table() {
        let cases: Vec<(PipelineError, u16)> = vec![
            (
                PipelineError::Fetch {
                    reason: "HTTP 503".into(),
                },
                502,
            ),
            (
                PipelineError::UnsupportedFormat {
                    detail: "no signature matched".into(),
                },
                400,
            ),
            (
                PipelineError::Engine {
                    message: "boom".into(),
                },
                500,
            ),
            (
                PipelineError::Packaging {
                    requested: ResponseShape::Markdown,
                    detail: "no markdown in result".into(),
                },
                500,
            ),
            (PipelineError::Timeout { secs: 30 }, 504),
            (PipelineError::Processing("scratch: disk full".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.status_code(), code, "wrong code for {err}");
        }
    }

    #[test]
    fn fetch_display_carries_the_reason() {
        let e = PipelineError::Fetch {
            reason: "HTTP 404 from upstream".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with("Error fetching document:"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn packaging_display_names_the_requested_shape() {
        let e = PipelineError::Packaging {
            requested: ResponseShape::Structured,
            detail: "engine produced markdown only".into(),
        };
        assert!(e.to_string().contains("structured"), "got: {e}");
    }

    #[test]
    fn engine_error_folds_into_the_engine_category() {
        let engine = EngineError::Http {
            status: 422,
            body: "cannot parse".into(),
        };
        let e: PipelineError = engine.into();
        assert_eq!(e.status_code(), 500);
        assert!(e.to_string().contains("HTTP 422"), "got: {e}");
    }

    #[test]
    fn timeout_display_names_the_deadline() {
        let e = PipelineError::Timeout { secs: 25 };
        assert!(e.to_string().contains("25s"), "got: {e}");
    }
}
