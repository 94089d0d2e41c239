//! Storage adapter trait.
//!
//! Implemented by the `votacao-store` crate (in-memory and JSON file). The
//! engine calls [`StorageAdapter::save`] once after every successful
//! mutation and never reads back mid-session.

use async_trait::async_trait;

use crate::model::Snapshot;

/// Backend that persists the whole state document.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Human-readable adapter name (e.g. "json").
    fn name(&self) -> &str;

    /// Load the last saved document, or `None` if nothing was saved yet.
    async fn load(&self) -> anyhow::Result<Option<Snapshot>>;

    /// Replace the stored document with `snapshot`.
    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}
