//! In-memory storage for tests and throwaway sessions.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use votacao_core::model::Snapshot;
use votacao_core::traits::StorageAdapter;

/// Keeps the last saved snapshot in memory.
///
/// Nothing survives the process; the save counter lets tests assert that
/// every mutation persisted exactly once.
#[derive(Default)]
pub struct MemoryStorage {
    stored: Mutex<Option<Snapshot>>,
    save_count: AtomicU32,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `snapshot` already stored, as if saved by an earlier run.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            save_count: AtomicU32::new(0),
        }
    }

    /// Number of saves since construction.
    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    /// The last saved snapshot.
    pub async fn last_saved(&self) -> Option<Snapshot> {
        self.stored.lock().await.clone()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> anyhow::Result<Option<Snapshot>> {
        Ok(self.stored.lock().await.clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        self.save_count.fetch_add(1, Ordering::Relaxed);
        *self.stored.lock().await = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votacao_core::model::Class;

    #[tokio::test]
    async fn starts_empty() {
        let storage = MemoryStorage::new();
        assert!(storage.load().await.unwrap().is_none());
        assert_eq!(storage.save_count(), 0);
    }

    #[tokio::test]
    async fn save_then_load() {
        let storage = MemoryStorage::new();
        let mut snapshot = Snapshot::default();
        snapshot.data.classes.push(Class::new("M", "Manhã"));

        storage.save(&snapshot).await.unwrap();
        storage.save(&snapshot).await.unwrap();

        assert_eq!(storage.save_count(), 2);
        assert_eq!(storage.load().await.unwrap(), Some(snapshot));
    }

    #[tokio::test]
    async fn with_snapshot_preloads() {
        let storage = MemoryStorage::with_snapshot(Snapshot::default());
        assert!(storage.last_saved().await.is_some());
        assert_eq!(storage.save_count(), 0);
    }
}
