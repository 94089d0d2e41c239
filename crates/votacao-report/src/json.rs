//! Full JSON export.

use std::path::Path;

use anyhow::{Context, Result};

use votacao_core::repository::Repository;

/// Every collection under its persisted key: `users`, `turmas`, `perguntas`,
/// `topicos`, `votos`, `estrelas`.
pub fn generate_json(repo: &Repository) -> Result<serde_json::Value> {
    serde_json::to_value(repo.collections()).context("failed to serialize export")
}

/// Write the JSON export to a file.
pub fn write_json_export(repo: &Repository, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(&generate_json(repo)?)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write export to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::tests::fixture;

    #[test]
    fn export_has_every_collection() {
        let json = generate_json(&fixture()).unwrap();
        for key in ["users", "turmas", "perguntas", "topicos", "votos", "estrelas"] {
            assert!(json[key].is_array(), "missing {key}");
        }
        assert_eq!(json["topicos"].as_array().unwrap().len(), 2);
        // Raw export keeps orphaned votes
        assert_eq!(json["votos"].as_array().unwrap().len(), 3);
        assert!(json.get("nextTopicoId").is_none());
    }

    #[test]
    fn write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("dados-votacao.json");
        write_json_export(&fixture(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["turmas"][0]["name"], "Manhã");
    }
}
