//! The `votacao report` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use votacao_core::report::ClassReport;

pub async fn execute(class_id: String, format: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let engine = super::open_engine_read_only(&config).await?;
    let report = engine.class_report(&class_id)?;

    match format.as_str() {
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_tables(&report),
        other => anyhow::bail!("unknown format: {other} (expected text, markdown or json)"),
    }

    Ok(())
}

fn print_tables(report: &ClassReport) {
    println!(
        "{} ({}): {} topics, {} votes, {} stars",
        report.class.name,
        report.class.id,
        report.topic_count(),
        report.total_votes(),
        report.total_stars()
    );

    let mut by_score = Table::new();
    by_score.set_header(vec!["#", "Topic", "Presenter", "Mean", "Votes"]);
    for (i, s) in report.by_score.iter().enumerate() {
        by_score.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&s.text),
            Cell::new(&s.presenter_name),
            Cell::new(format!("{:.2}", s.mean)),
            Cell::new(s.vote_count),
        ]);
    }
    println!("\nBy score\n{by_score}");

    let mut by_stars = Table::new();
    by_stars.set_header(vec!["#", "Topic", "Presenter", "Stars"]);
    for (i, s) in report.by_stars.iter().enumerate() {
        by_stars.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&s.text),
            Cell::new(&s.presenter_name),
            Cell::new(s.star_count),
        ]);
    }
    println!("\nBy stars\n{by_stars}");
}
