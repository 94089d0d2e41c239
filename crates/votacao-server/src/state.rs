//! Shared application state.

use std::sync::Arc;

use tokio::sync::Mutex;

use votacao_core::VotingEngine;

/// State shared by every handler.
///
/// The engine sits behind one async mutex, so requests are applied one at a
/// time and every mutation is persisted before the next request reads.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Mutex<VotingEngine>>,
}

impl AppState {
    pub fn new(engine: VotingEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }
}
