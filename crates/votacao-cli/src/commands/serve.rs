//! The `votacao serve` command.

use std::path::PathBuf;

use anyhow::Result;

pub async fn execute(
    config_path: Option<PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(bind) = bind {
        config.bind = bind;
    }
    votacao_server::serve(config).await
}
