//! JSON5 file-backed cron job store (read side only).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cronview_config::ConfigError;
use cronview_types::CronJob;

use crate::source::{JobSource, SourceError};

/// On-disk layout of the store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronStoreFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub jobs: Vec<CronJob>,
}

fn default_version() -> u32 {
    1
}

impl Default for CronStoreFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            jobs: Vec::new(),
        }
    }
}

/// Resolve the store path from config.
///
/// Blank or missing → `~/.cronview/cron/jobs.json`. A leading `~` is
/// expanded to the home directory.
pub fn resolve_store_path(configured: Option<&str>) -> Result<PathBuf, ConfigError> {
    match configured.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => expand_home(raw),
        None => Ok(cronview_config::config_dir()?.join("cron").join("jobs.json")),
    }
}

fn expand_home(raw: &str) -> Result<PathBuf, ConfigError> {
    if raw == "~" {
        return dirs::home_dir().ok_or(ConfigError::NoDirFound);
    }
    match raw.strip_prefix("~/") {
        Some(rest) => Ok(dirs::home_dir().ok_or(ConfigError::NoDirFound)?.join(rest)),
        None => Ok(PathBuf::from(raw)),
    }
}

/// Load the store file. A missing file is an empty store.
pub async fn load_store(path: &Path) -> Result<CronStoreFile, SourceError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Cron store not found at {}, treating as empty", path.display());
            return Ok(CronStoreFile::default());
        }
        Err(source) => {
            return Err(SourceError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    json5::from_str(&content).map_err(|source| SourceError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

enum StoreLocation {
    Path(PathBuf),
    /// Raw `cron.store` setting, resolved on each listing.
    Configured(Option<String>),
}

/// Reads jobs from the local store file on every call.
pub struct StoreJobSource {
    location: StoreLocation,
}

impl StoreJobSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::Path(path.into()),
        }
    }

    /// Defer path resolution (see [`resolve_store_path`]) until jobs are
    /// listed, so a bad setting surfaces as a listing error.
    pub fn from_config(configured: Option<&str>) -> Self {
        Self {
            location: StoreLocation::Configured(configured.map(String::from)),
        }
    }

    fn resolve(&self) -> Result<PathBuf, SourceError> {
        match &self.location {
            StoreLocation::Path(path) => Ok(path.clone()),
            StoreLocation::Configured(raw) => Ok(resolve_store_path(raw.as_deref())?),
        }
    }
}

#[async_trait]
impl JobSource for StoreJobSource {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn list_jobs(&self, include_disabled: bool) -> Result<Vec<CronJob>, SourceError> {
        let path = self.resolve()?;
        let store = load_store(&path).await?;
        debug!(
            path = %path.display(),
            jobs = store.jobs.len(),
            "Loaded cron store"
        );
        let jobs = if include_disabled {
            store.jobs
        } else {
            store.jobs.into_iter().filter(|j| j.enabled).collect()
        };
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cronview_types::CronSchedule;

    const STORE: &str = r#"{
        // written by the scheduler
        version: 1,
        jobs: [
            {
                id: "a",
                name: "Backup",
                enabled: true,
                schedule: { kind: "every", everyMs: 3600000 },
                payload: { kind: "systemEvent", text: "Run nightly backup" },
                state: { lastStatus: "ok" },
            },
            {
                id: "b",
                name: "Digest",
                enabled: false,
                schedule: { kind: "cron", expr: "0 7 * * *" },
                payload: { kind: "agentTurn", message: "Summarize inbox" },
            },
        ],
    }"#;

    #[tokio::test]
    async fn test_list_jobs_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, STORE).unwrap();

        let source = StoreJobSource::new(&path);
        let jobs = source.list_jobs(true).await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].name, "Backup");
        assert_eq!(jobs[1].name, "Digest");
        assert_eq!(jobs[0].schedule, CronSchedule::Every { every_ms: 3_600_000 });
    }

    #[tokio::test]
    async fn test_list_jobs_excludes_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, STORE).unwrap();

        let jobs = StoreJobSource::new(&path).list_jobs(false).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "a");
    }

    #[tokio::test]
    async fn test_null_job_fields_do_not_fail_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(
            &path,
            r#"{
                jobs: [
                    { id: "a", name: "A", state: null },
                    { id: "b", name: null, schedule: null },
                    { id: 7, name: "Numeric", payload: null },
                ],
            }"#,
        )
        .unwrap();

        let jobs = StoreJobSource::new(&path).list_jobs(true).await.unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].state.last_status, None);
        assert!(jobs[1].name.is_empty());
        assert_eq!(jobs[1].schedule, CronSchedule::default());
        assert_eq!(jobs[2].id, "7");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = StoreJobSource::new(dir.path().join("absent.json"));
        assert!(source.list_jobs(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_jobs_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "{ version: 1 }").unwrap();
        assert!(StoreJobSource::new(&path).list_jobs(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_path_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let err = StoreJobSource::new(dir.path()).list_jobs(true).await.unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }

    #[tokio::test]
    async fn test_malformed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, "{ jobs: [ ").unwrap();
        let err = StoreJobSource::new(&path).list_jobs(true).await.unwrap_err();
        assert!(matches!(err, SourceError::Malformed { .. }));
        assert!(err.to_string().contains("malformed cron store"));
    }

    #[tokio::test]
    async fn test_from_config_resolves_on_listing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, STORE).unwrap();

        let raw = path.display().to_string();
        let source = StoreJobSource::from_config(Some(&raw));
        assert_eq!(source.list_jobs(true).await.unwrap().len(), 2);

        std::fs::remove_file(&path).unwrap();
        assert!(source.list_jobs(true).await.unwrap().is_empty());
    }

    #[test]
    fn test_unresolvable_path_is_source_error() {
        let err: SourceError = ConfigError::NoDirFound.into();
        assert!(matches!(err, SourceError::StorePath(_)));
        assert!(err.to_string().starts_with("cannot resolve cron store path"));
    }

    #[test]
    fn test_resolve_store_path() {
        assert_eq!(
            resolve_store_path(Some("/var/lib/cron/jobs.json")).unwrap(),
            PathBuf::from("/var/lib/cron/jobs.json")
        );
        assert_eq!(
            resolve_store_path(Some("relative/jobs.json")).unwrap(),
            PathBuf::from("relative/jobs.json")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                resolve_store_path(Some("~/jobs.json")).unwrap(),
                home.join("jobs.json")
            );
            assert_eq!(
                resolve_store_path(None).unwrap(),
                home.join(".cronview").join("cron").join("jobs.json")
            );
            assert_eq!(resolve_store_path(Some("  ")).unwrap(), resolve_store_path(None).unwrap());
        }
    }
}
