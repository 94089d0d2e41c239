pub mod export;
pub mod init;
pub mod report;
pub mod reset;
pub mod serve;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;

use votacao_core::VotingEngine;
use votacao_store::{create_storage, load_config_from, VotacaoConfig};

/// Open the configured storage the same way the server does.
pub(crate) async fn open_engine(config: &VotacaoConfig) -> Result<VotingEngine> {
    VotingEngine::open(
        create_storage(&config.storage),
        config.load_seed()?,
        config.identity_resolver(),
        config.to_rules(),
    )
    .await
}

/// Open for reading only: an empty store is not written to.
pub(crate) async fn open_engine_read_only(config: &VotacaoConfig) -> Result<VotingEngine> {
    VotingEngine::open_read_only(
        create_storage(&config.storage),
        config.load_seed()?,
        config.identity_resolver(),
        config.to_rules(),
    )
    .await
}

pub(crate) fn load_config(path: Option<PathBuf>) -> Result<VotacaoConfig> {
    load_config_from(path.as_deref())
}
