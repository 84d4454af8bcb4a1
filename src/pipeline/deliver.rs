//! Output delivery: derive the destination key and write back to storage.
//!
//! Key derivation is segment-literal: a path segment exactly equal to
//! `input` becomes `output`, and only the final extension is rewritten to
//! `md`. Substrings elsewhere in the key are never touched, so a key like
//! `input/input.pdf` derives to `output/input.md` and nothing else.

use tracing::info;

use crate::error::PipelineError;
use crate::outcome::Payload;
use crate::pipeline::input::key_basename;
use crate::scratch::Scratch;
use crate::store::ObjectStore;

/// Derive the object key the converted document is written to.
///
/// Total over all keys: a key without an `input` segment only has its
/// extension rewritten, and a key without an extension gets `.md` appended.
pub fn derive_output_key(key: &str) -> String {
    let segments: Vec<&str> = key
        .split('/')
        .map(|segment| {
            if segment == "input" {
                "output"
            } else {
                segment
            }
        })
        .collect();

    let mut derived: Vec<String> = segments.iter().map(|s| s.to_string()).collect();
    if let Some(last) = derived.last_mut() {
        *last = replace_final_extension(last);
    }
    derived.join("/")
}

fn replace_final_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{stem}.md"),
        _ => format!("{name}.md"),
    }
}

/// Stage the payload, upload it, release the staged copy.
///
/// The staged file is discarded whether or not the upload landed; a failed
/// upload must not leave scratch files behind.
pub async fn write_back(
    store: &dyn ObjectStore,
    bucket: &str,
    input_key: &str,
    payload: &Payload,
    scratch: &Scratch,
) -> Result<String, PipelineError> {
    let output_key = derive_output_key(input_key);
    let bytes = payload
        .to_bytes()
        .map_err(|e| PipelineError::Processing(format!("cannot serialize payload: {e}")))?;

    let staged = scratch
        .stage(key_basename(&output_key), &bytes)
        .map_err(|e| PipelineError::Processing(format!("failed to stage payload: {e}")))?;

    info!("Uploading converted document to: {}/{}", bucket, output_key);
    let upload = store.put(bucket, &output_key, &staged).await;
    scratch.discard(&staged);
    upload.map_err(|e| PipelineError::Processing(format!("upload failed: {e}")))?;

    Ok(output_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::ObjectStore;
    use async_trait::async_trait;
    use std::path::Path;

    #[test]
    fn input_segments_swap_and_final_extension_rewrites() {
        assert_eq!(derive_output_key("input/report.pdf"), "output/report.md");
        assert_eq!(
            derive_output_key("tenant/input/q3/report.docx"),
            "tenant/output/q3/report.md"
        );
    }

    #[test]
    fn only_literal_input_segments_are_swapped() {
        assert_eq!(derive_output_key("inputs/report.pdf"), "inputs/report.md");
        assert_eq!(derive_output_key("input/input.pdf"), "output/input.md");
    }

    #[test]
    fn keys_without_an_input_segment_still_derive() {
        assert_eq!(derive_output_key("docs/report.pdf"), "docs/report.md");
        assert_eq!(derive_output_key("report.epub"), "report.md");
    }

    #[test]
    fn only_the_final_extension_changes() {
        assert_eq!(derive_output_key("input/archive.tar.gz"), "output/archive.tar.md");
        assert_eq!(
            derive_output_key("input/report.pdf.pdf"),
            "output/report.pdf.md"
        );
    }

    #[test]
    fn extensionless_keys_gain_md() {
        assert_eq!(derive_output_key("input/README"), "output/README.md");
    }

    struct RejectingStore;

    #[async_trait]
    impl ObjectStore for RejectingStore {
        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::NotFound {
                bucket: bucket.into(),
                key: key.into(),
            })
        }

        async fn put(&self, _: &str, _: &str, _: &Path) -> Result<(), StoreError> {
            Err(StoreError::Backend("disk full".into()))
        }
    }

    #[tokio::test]
    async fn failed_uploads_still_release_the_staged_file() {
        let scratch = Scratch::new(None).unwrap();
        let payload = Payload::Markdown("# converted".into());
        let err = write_back(&RejectingStore, "docs", "input/report.pdf", &payload, &scratch)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("disk full"), "got: {err}");
        assert_eq!(scratch.outstanding(), 0, "staged payload leaked");
    }
}
