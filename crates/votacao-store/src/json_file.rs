//! JSON file storage.
//!
//! The whole state lives in one pretty-printed document that is rewritten on
//! every save. Writes go to a sibling temp file first and are renamed into
//! place, so a crash mid-write leaves the previous document intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use votacao_core::model::Snapshot;
use votacao_core::traits::StorageAdapter;

use crate::error::StoreError;

/// Persists the state document to a file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "db.json".into());
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    /// Read and parse the document. `Ok(None)` when the file does not exist.
    pub async fn read_snapshot(&self) -> Result<Option<Snapshot>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })
    }

    /// Serialize and atomically replace the document.
    pub async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for JsonFileStorage {
    fn name(&self) -> &str {
        "json"
    }

    /// A corrupt document is moved aside and treated as absent, so the
    /// session starts over from the seed instead of refusing to boot.
    async fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        match self.read_snapshot().await {
            Ok(snapshot) => Ok(snapshot),
            Err(err @ StoreError::Corrupt { .. }) => {
                let aside = self.quarantine_path();
                tracing::warn!("{err}; moving it to {} and starting fresh", aside.display());
                tokio::fs::rename(&self.path, &aside)
                    .await
                    .map_err(|e| StoreError::io(&aside, e))?;
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.write_snapshot(snapshot).await?;
        tracing::trace!("saved state to {}", self.path.display());
        Ok(())
    }
}
