//! Configuration for pipeline invocations.
//!
//! Every knob lives in [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. One struct keeps invocations reproducible:
//! log it once at startup and two differing runs explain themselves.

use std::path::PathBuf;

use crate::error::PipelineError;

/// Default engine worker hint. Matches the thread count document engines
/// typically saturate a small host with.
pub const DEFAULT_ENGINE_WORKERS: usize = 8;

/// Upper bound on the worker hint a caller can ask for.
pub const MAX_ENGINE_WORKERS: usize = 64;

/// Default timeout for fetching a remote document, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

/// Configuration for a [`crate::Pipeline`].
///
/// Built via [`PipelineConfig::builder()`] or [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use docingest::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .engine_workers(4)
///     .deadline_secs(25)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Worker hint forwarded to the conversion engine. Range: 1–64. Default: 8.
    ///
    /// Engines treat this as internal parallelism, not as a batch size.
    /// Event-style deployments that convert one document per invocation on
    /// a small host usually set 1.
    pub engine_workers: usize,

    /// Timeout for fetching a remote document, in seconds. Default: 30.
    ///
    /// Applies to the single fetch attempt only; elapse is classified as a
    /// fetch failure, not as the invocation deadline.
    pub download_timeout_secs: u64,

    /// Directory to create per-invocation scratch space under.
    /// `None` uses the system temp directory.
    pub scratch_root: Option<PathBuf>,

    /// Overall invocation deadline in seconds, imposed by the handler.
    /// `None` leaves the invocation unbounded. The engine call itself
    /// carries no timeout, so this is the only bound on a conversion.
    pub deadline_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            engine_workers: DEFAULT_ENGINE_WORKERS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            scratch_root: None,
            deadline_secs: None,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn engine_workers(mut self, n: usize) -> Self {
        self.config.engine_workers = n.clamp(1, MAX_ENGINE_WORKERS);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(root.into());
        self
    }

    pub fn deadline_secs(mut self, secs: u64) -> Self {
        self.config.deadline_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PipelineError> {
        if self.config.deadline_secs == Some(0) {
            return Err(PipelineError::Processing(
                "invalid configuration: deadline must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = PipelineConfig::default();
        assert_eq!(c.engine_workers, 8);
        assert_eq!(c.download_timeout_secs, 30);
        assert!(c.scratch_root.is_none());
        assert!(c.deadline_secs.is_none());
    }

    #[test]
    fn worker_hint_is_clamped_to_range() {
        let c = PipelineConfig::builder().engine_workers(0).build().unwrap();
        assert_eq!(c.engine_workers, 1);
        let c = PipelineConfig::builder()
            .engine_workers(500)
            .build()
            .unwrap();
        assert_eq!(c.engine_workers, MAX_ENGINE_WORKERS);
    }

    #[test]
    fn zero_deadline_is_rejected() {
        let err = PipelineConfig::builder().deadline_secs(0).build().unwrap_err();
        assert!(err.to_string().contains("deadline"), "got: {err}");
    }

    #[test]
    fn zero_download_timeout_is_raised_to_one() {
        let c = PipelineConfig::builder()
            .download_timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(c.download_timeout_secs, 1);
    }
}
