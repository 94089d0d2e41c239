//! The `votacao reset` command.

use std::path::PathBuf;

use anyhow::Result;

pub async fn execute(reseed: bool, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let mut engine = super::open_engine(&config).await?;

    if reseed {
        let seed = config.load_seed()?;
        engine.reseed(seed).await;
        println!("State rebuilt from seed.");
    } else {
        let (votes, stars) = (
            engine.repository().votes().len(),
            engine.repository().stars().len(),
        );
        engine.reset_votes().await;
        println!("Cleared {votes} votes and {stars} stars.");
    }

    Ok(())
}
