//! The `votacao export` command.

use std::path::PathBuf;

use anyhow::Result;

use votacao_report::{
    write_json_export, write_xlsx_export, JSON_EXPORT_FILENAME, XLSX_EXPORT_FILENAME,
};

pub async fn execute(
    format: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let engine = super::open_engine_read_only(&config).await?;
    let repo = engine.repository();

    let path = match format.as_str() {
        "json" => {
            let path = output.unwrap_or_else(|| PathBuf::from(JSON_EXPORT_FILENAME));
            write_json_export(repo, &path)?;
            path
        }
        "xlsx" | "excel" => {
            let path = output.unwrap_or_else(|| PathBuf::from(XLSX_EXPORT_FILENAME));
            write_xlsx_export(repo, &path)?;
            path
        }
        other => anyhow::bail!("unknown format: {other} (expected json or xlsx)"),
    };

    println!(
        "Exported {} votes and {} stars to {}",
        repo.votes().len(),
        repo.stars().len(),
        path.display()
    );
    Ok(())
}
