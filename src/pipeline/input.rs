//! Source resolution: turn a [`Source`] into bytes the pipeline can work on.
//!
//! ## Why stage object-store bytes to a file?
//!
//! Engines commonly want a file-system path rather than a byte buffer, and
//! a store object already carries a basename worth preserving. URL blobs
//! stay in memory instead: they are detected by content signature and reach
//! the engine under a synthetic name. Either way the raw bytes are in hand
//! before any filesystem artifact exists, which is what the detector needs.
//!
//! Presigned URLs are bearer credentials. Every log line and error reason
//! in this module goes through [`redact_url`], and reqwest errors are
//! stripped of their embedded URL before display.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::PipelineError;
use crate::request::{redact_url, Source};
use crate::scratch::Scratch;
use crate::store::ObjectStore;

/// A resolved source: its bytes, plus a staged file for store objects.
#[derive(Debug)]
pub struct ResolvedSource {
    pub(crate) bytes: Vec<u8>,
    pub(crate) staged: Option<PathBuf>,
    pub(crate) basename: Option<String>,
}

impl ResolvedSource {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Path of the staged copy, when one exists.
    pub fn staged_path(&self) -> Option<&Path> {
        self.staged.as_deref()
    }

    /// Original basename, when the source had one.
    pub fn basename(&self) -> Option<&str> {
        self.basename.as_deref()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Resolve a source to bytes. One attempt, no retry.
pub async fn resolve(
    source: &Source,
    store: Option<&dyn ObjectStore>,
    scratch: &Scratch,
    timeout_secs: u64,
) -> Result<ResolvedSource, PipelineError> {
    match source {
        Source::RemoteUrl(url) => fetch_url(url, timeout_secs).await,
        Source::ObjectRef { bucket, key } => fetch_object(store, bucket, key, scratch).await,
    }
}

/// Final path component of an object key.
pub(crate) fn key_basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

async fn fetch_url(url: &str, timeout_secs: u64) -> Result<ResolvedSource, PipelineError> {
    info!("Fetching document from: {}", redact_url(url));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::Fetch {
            reason: e.without_url().to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("timed out after {timeout_secs}s")
        } else {
            e.without_url().to_string()
        };
        PipelineError::Fetch {
            reason: format!("{reason} (url {})", redact_url(url)),
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Fetch {
            reason: format!("HTTP {} from upstream (url {})", status, redact_url(url)),
        });
    }

    let bytes = response.bytes().await.map_err(|e| PipelineError::Fetch {
        reason: format!("{} (url {})", e.without_url(), redact_url(url)),
    })?;

    if bytes.is_empty() {
        return Err(PipelineError::Fetch {
            reason: format!("empty response body (url {})", redact_url(url)),
        });
    }

    debug!("Fetched {} bytes", bytes.len());
    Ok(ResolvedSource {
        bytes: bytes.to_vec(),
        staged: None,
        basename: None,
    })
}

async fn fetch_object(
    store: Option<&dyn ObjectStore>,
    bucket: &str,
    key: &str,
    scratch: &Scratch,
) -> Result<ResolvedSource, PipelineError> {
    let store = store.ok_or_else(|| {
        PipelineError::Processing("no object store configured for object sources".into())
    })?;

    info!("Fetching object: {}/{}", bucket, key);
    let bytes = store
        .get(bucket, key)
        .await
        .map_err(|e| PipelineError::Fetch {
            reason: e.to_string(),
        })?;

    if bytes.is_empty() {
        return Err(PipelineError::Fetch {
            reason: format!("object {bucket}/{key} is empty"),
        });
    }

    let basename = key_basename(key);
    let staged = scratch
        .stage(basename, &bytes)
        .map_err(|e| PipelineError::Processing(format!("failed to stage object: {e}")))?;
    debug!("Staged object to: {}", staged.display());

    Ok(ResolvedSource {
        bytes,
        staged: Some(staged),
        basename: Some(basename.to_string()),
    })
}
