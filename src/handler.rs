//! Trigger adapters: the two invocation styles the pipeline serves.
//!
//! * [`handle_sync`] — an interactive caller posts a presigned URL plus
//!   flags and waits for the converted payload in the response body.
//! * [`handle_event`] — a storage notification names a freshly uploaded
//!   object; the converted Markdown is written back next to it and the
//!   response carries the derived key.
//!
//! Both adapters classify every failure and answer with the category's
//! status code; neither panics. The invocation deadline from
//! [`crate::PipelineConfig`] is applied here — the host runtime owns the
//! clock, not the pipeline.

use serde::{Deserialize, Serialize};
use tokio::time::{timeout, Duration};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::outcome::{ConversionOutcome, Payload};
use crate::pipeline::{DeliveryMode, Pipeline};
use crate::request::{redact_url, ConversionRequest, ResponseShape, Source};

fn default_true() -> bool {
    true
}

/// Synchronous conversion request, as posted by an interactive caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    /// Presigned URL of the document. Required; everything else defaults.
    #[serde(default)]
    pub presigned_url: String,

    /// Run OCR passes over page images. Default: false.
    #[serde(default)]
    pub is_image_present: bool,

    /// Return Markdown (`true`) or the structured mapping (`false`).
    /// Default: true.
    #[serde(default = "default_true")]
    pub is_md_response: bool,
}

/// Storage notification: an object landed in a watched bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageEvent {
    pub bucket: String,
    pub key: String,
}

/// Envelope for the synchronous flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub status_code: u16,
    pub body: SyncBody,
}

/// Payload on success, the error display string otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SyncBody {
    Payload(Payload),
    Error(String),
}

/// Envelope for the event flow.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status_code: u16,
    pub body: EventBody,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EventBody {
    #[serde(rename_all = "camelCase")]
    Ok { message: String, file_path: String },
    Err { error: String },
}

/// Serve a synchronous conversion: fetch, convert, answer inline.
///
/// A missing URL never reaches the pipeline — it is a validation failure
/// of the request envelope itself.
pub async fn handle_sync(pipeline: &Pipeline, event: SyncEvent) -> SyncResponse {
    if event.presigned_url.is_empty() {
        warn!("Synchronous request without a presigned URL");
        return SyncResponse {
            status_code: 400,
            body: SyncBody::Error("Missing presigned URL parameter".into()),
        };
    }

    info!(
        "Processing document from URL: {}",
        redact_url(&event.presigned_url)
    );
    let shape = if event.is_md_response {
        ResponseShape::Markdown
    } else {
        ResponseShape::Structured
    };
    let request = ConversionRequest::new(
        Source::RemoteUrl(event.presigned_url),
        event.is_image_present,
        shape,
    );

    match run_with_deadline(pipeline, &request, DeliveryMode::Inline).await {
        Ok(outcome) => SyncResponse {
            status_code: 200,
            body: SyncBody::Payload(outcome.payload),
        },
        Err(e) => {
            warn!("Conversion failed: {}", e);
            SyncResponse {
                status_code: e.status_code(),
                body: SyncBody::Error(e.to_string()),
            }
        }
    }
}

/// Serve a storage event: convert the named object and write the Markdown
/// back at the derived key.
///
/// The response shape is fixed to Markdown here; the derived `.md` key
/// would make no sense for anything else.
pub async fn handle_event(pipeline: &Pipeline, event: StorageEvent) -> EventResponse {
    info!("Processing object: {}/{}", event.bucket, event.key);
    let request = ConversionRequest::new(
        Source::ObjectRef {
            bucket: event.bucket,
            key: event.key,
        },
        false,
        ResponseShape::Markdown,
    );

    match run_with_deadline(pipeline, &request, DeliveryMode::WriteBack).await {
        Ok(outcome) => EventResponse {
            status_code: 200,
            body: EventBody::Ok {
                message: "markdown successfully uploaded".into(),
                file_path: outcome.stored_at.unwrap_or_default(),
            },
        },
        Err(e) => {
            warn!("Conversion failed: {}", e);
            EventResponse {
                status_code: e.status_code(),
                body: EventBody::Err {
                    error: e.to_string(),
                },
            }
        }
    }
}

/// Run the pipeline under the configured deadline.
///
/// With no deadline configured the invocation is unbounded. Elapse maps
/// to [`PipelineError::Timeout`]; the pipeline's scratch space is dropped
/// with the cancelled future, so temp files do not outlive the deadline.
pub async fn run_with_deadline(
    pipeline: &Pipeline,
    request: &ConversionRequest,
    delivery: DeliveryMode,
) -> Result<ConversionOutcome, PipelineError> {
    match pipeline.config().deadline_secs {
        None => pipeline.run(request, delivery).await,
        Some(secs) => match timeout(Duration::from_secs(secs), pipeline.run(request, delivery))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout { secs }),
        },
    }
}
