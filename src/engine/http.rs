//! HTTP client for a conversion sidecar.
//!
//! Speaks to a service exposing `POST {endpoint}/convert`: the document
//! goes up as a multipart form (file part plus text fields for the kind
//! and options), the result comes back as JSON with optional `markdown`
//! and `structured` members.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EngineError;

use super::{ConversionEngine, EngineDocument, EngineRequest, EngineResult};

/// Engine backed by a conversion sidecar over HTTP.
///
/// The client carries no request timeout on purpose: the pipeline's
/// caller-imposed deadline is the only bound on a conversion.
pub struct HttpEngine {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WireResult {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    structured: Option<Map<String, Value>>,
}

impl HttpEngine {
    /// `endpoint` is the sidecar base URL, e.g. `http://localhost:3001`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ConversionEngine for HttpEngine {
    fn name(&self) -> &str {
        "http-sidecar"
    }

    async fn convert(&self, request: &EngineRequest) -> Result<EngineResult, EngineError> {
        let file_name = request.document.file_name();
        let data = match &request.document {
            EngineDocument::Bytes { data, .. } => data.clone(),
            EngineDocument::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| EngineError::Other(format!("cannot read staged file: {e}")))?,
        };

        let form = Form::new()
            .part("file", Part::bytes(data).file_name(file_name))
            .text("kind", request.kind.extension())
            .text("shape", request.options.shape.as_str())
            .text("imageHandling", request.options.image_handling.to_string())
            .text("workers", request.options.workers.to_string());

        let url = format!("{}/convert", self.endpoint);
        debug!(%url, kind = %request.kind, "dispatching document to sidecar");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResult = response
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        Ok(EngineResult::new(wire.markdown, wire.structured))
    }
}
