use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pennywise_application::OfflineQueueStore;
use pennywise_core::{AppError, AppResult};
use pennywise_domain::QueuedRequest;
use tracing::warn;

/// Offline queue persisted as one JSON array on disk.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous queue intact.
#[derive(Debug, Clone)]
pub struct JsonFileOfflineQueueStore {
    path: PathBuf,
}

impl JsonFileOfflineQueueStore {
    /// Creates a store for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the queue file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = OsString::from(self.path.as_os_str());
        file_name.push(".tmp");
        PathBuf::from(file_name)
    }
}

#[async_trait]
impl OfflineQueueStore for JsonFileOfflineQueueStore {
    async fn load(&self) -> AppResult<Vec<QueuedRequest>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read offline queue '{}': {error}",
                    self.path.display()
                )));
            }
        };

        match serde_json::from_slice::<Vec<QueuedRequest>>(&bytes) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    error = %error,
                    "offline queue file is unreadable, starting with an empty queue"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, entries: &[QueuedRequest]) -> AppResult<()> {
        let encoded = serde_json::to_vec_pretty(entries).map_err(|error| {
            AppError::Internal(format!("failed to encode offline queue: {error}"))
        })?;

        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to create offline queue directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, encoded).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to write offline queue '{}': {error}",
                temp_path.display()
            ))
        })?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to replace offline queue '{}': {error}",
                    self.path.display()
                ))
            })
    }
}
