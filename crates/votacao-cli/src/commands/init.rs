//! The `votacao init` command.

use std::path::Path;

use anyhow::Result;

use votacao_core::parser::DEFAULT_SEED;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("votacao.toml"), SAMPLE_CONFIG)?;
    write_if_missing(Path::new("seed.toml"), DEFAULT_SEED)?;

    println!("\nNext steps:");
    println!("  1. Edit seed.toml with your classes, presenters and voters");
    println!("  2. Run: votacao validate --seed seed.toml");
    println!("  3. Run: votacao serve");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# votacao configuration

bind = "0.0.0.0"
port = 3000
seed_path = "seed.toml"

# "overlap" blocks a voter whose name shares a word with the presenter's,
# "exact" only blocks identical names.
identity = "overlap"

leader_codes = ["1", "2", "3", "4", "5", "6"]
leader_max_score = 10
default_max_score = 5
star_quota = 5
placeholder_topics = 3
max_questions = 3

[storage]
type = "json"
path = "db.json"
"#;
