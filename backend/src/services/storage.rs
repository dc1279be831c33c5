//! Uploaded document storage
//!
//! Persists uploaded files under the configured uploads directory, one
//! subfolder per document kind. Independent files may be saved
//! concurrently; there is no ordering dependency between them.

use std::path::PathBuf;

use chrono::Utc;

use crate::config::UploadsConfig;
use crate::error::{AppError, AppResult};

/// Filesystem store for uploaded documents
#[derive(Clone)]
pub struct UploadStore {
    base_dir: PathBuf,
}

impl UploadStore {
    pub fn new(config: &UploadsConfig) -> Self {
        Self {
            base_dir: PathBuf::from(&config.base_dir),
        }
    }

    /// Save a file under `<base>/<folder>/`, prefixing the name with a
    /// timestamp to keep it unique. Returns the stored path as a string.
    pub async fn save(&self, folder: &str, original_name: &str, bytes: &[u8]) -> AppResult<String> {
        let dir = self.base_dir.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to create {}: {}", dir.display(), e)))?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            original_name.replace(' ', "_")
        );
        let path = dir.join(file_name);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to write {}: {}", path.display(), e)))?;

        Ok(path.to_string_lossy().into_owned())
    }
}
