//! Class report types with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Class;
use crate::statistics::{rank_by_score, rank_by_stars, TopicStats};

/// Rankings of one class at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    #[serde(rename = "turma")]
    pub class: Class,
    /// Topics by mean score, highest first.
    #[serde(rename = "rankingNotas")]
    pub by_score: Vec<TopicStats>,
    /// Topics by star count, most first.
    #[serde(rename = "rankingEstrelas")]
    pub by_stars: Vec<TopicStats>,
}

impl ClassReport {
    /// Build both rankings from per-topic stats given in topic order.
    pub fn new(class: Class, stats: Vec<TopicStats>) -> Self {
        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            class,
            by_score: rank_by_score(&stats),
            by_stars: rank_by_stars(&stats),
        }
    }

    pub fn topic_count(&self) -> usize {
        self.by_score.len()
    }

    pub fn total_votes(&self) -> usize {
        self.by_score.iter().map(|s| s.vote_count).sum()
    }

    pub fn total_stars(&self) -> usize {
        self.by_score.iter().map(|s| s.star_count).sum()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ClassReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {} ({})\n\n", self.class.name, self.class.id));
        md.push_str(&format!(
            "**Summary:** {} topics, {} votes, {} stars. Generated {}\n\n",
            self.topic_count(),
            self.total_votes(),
            self.total_stars(),
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));

        md.push_str("### Ranking by score\n\n");
        md.push_str("| # | Topic | Presenter | Mean | Votes |\n");
        md.push_str("|---|-------|-----------|------|-------|\n");
        for (i, s) in self.by_score.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2} | {} |\n",
                i + 1,
                escape_cell(&s.text),
                escape_cell(&s.presenter_name),
                s.mean,
                s.vote_count
            ));
        }
        md.push('\n');

        md.push_str("### Ranking by stars\n\n");
        md.push_str("| # | Topic | Presenter | Stars |\n");
        md.push_str("|---|-------|-----------|-------|\n");
        for (i, s) in self.by_stars.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                i + 1,
                escape_cell(&s.text),
                escape_cell(&s.presenter_name),
                s.star_count
            ));
        }

        md
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
