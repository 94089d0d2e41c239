//! The `votacao validate` command.

use std::path::PathBuf;

use anyhow::Result;

use votacao_core::identity::IdentityStrategy;
use votacao_core::parser::{parse_seed, validate_seed};

pub fn execute(
    seed_path: Option<PathBuf>,
    identity: Option<IdentityStrategy>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let seed = match seed_path {
        Some(path) => parse_seed(&path)?,
        None => config.load_seed()?,
    };

    let questions: usize = seed.presenters.iter().map(|p| p.questions.len()).sum();
    println!(
        "Seed: {} classes, {} presenters, {} questions, {} voters, {} admins",
        seed.classes.len(),
        seed.presenters.len(),
        questions,
        seed.voters.len(),
        seed.admins.len()
    );

    let matcher = identity.unwrap_or(config.identity).matcher();
    let warnings = validate_seed(&seed, config.max_questions, matcher.as_ref());
    for w in &warnings {
        let prefix = w
            .subject
            .as_ref()
            .map(|s| format!("  [{s}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Seed valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
