//! Job source abstraction.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use cronview_config::ConfigError;
use cronview_types::CronJob;

/// Errors raised while acquiring jobs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot resolve cron store path: {0}")]
    StorePath(#[from] ConfigError),
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed cron store {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        source: json5::Error,
    },
    #[error("gateway transport error: {0}")]
    Transport(String),
    #[error("gateway error: {0}")]
    Remote(String),
    #[error("gateway timed out after {0}ms")]
    Timeout(u64),
}

/// Something that can list cron jobs.
///
/// Implementations return jobs in source order and never cache between
/// calls.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Short name for logs ("store", "gateway").
    fn name(&self) -> &'static str;

    /// Fetch the current job list.
    async fn list_jobs(&self, include_disabled: bool) -> Result<Vec<CronJob>, SourceError>;
}
