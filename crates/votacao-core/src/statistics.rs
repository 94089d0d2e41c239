//! Per-topic aggregation and rankings.

use serde::{Deserialize, Serialize};

use crate::model::Topic;
use crate::repository::Repository;

/// Display name used when a code no longer resolves to a user.
pub const UNKNOWN_NAME: &str = "Desconhecido";

/// One vote inside a [`TopicStats`], with the voter's name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteDetail {
    #[serde(rename = "userCode")]
    pub voter_code: String,
    #[serde(rename = "userName")]
    pub voter_name: String,
    #[serde(rename = "nota", serialize_with = "crate::model::score::serialize")]
    pub score: f64,
}

/// Aggregated results for a single topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicStats {
    #[serde(rename = "topicoId")]
    pub topic_id: String,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "apresentadorNome")]
    pub presenter_name: String,
    /// Arithmetic mean of the scores, 0 when nobody voted.
    #[serde(rename = "media")]
    pub mean: f64,
    #[serde(rename = "qtdVotos")]
    pub vote_count: usize,
    #[serde(rename = "totalEstrelas")]
    pub star_count: usize,
    #[serde(rename = "votosDetalhados")]
    pub votes: Vec<VoteDetail>,
}

/// Resolve a user's display name, falling back to [`UNKNOWN_NAME`].
pub fn display_name(repo: &Repository, code: &str) -> String {
    repo.user(code)
        .map(|u| u.name.clone())
        .unwrap_or_else(|| UNKNOWN_NAME.to_string())
}

/// Arithmetic mean, or 0.0 for an empty slice.
pub fn mean_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Compute the stats of one topic.
pub fn topic_stats(repo: &Repository, topic: &Topic) -> TopicStats {
    let votes: Vec<VoteDetail> = repo
        .votes_for_topic(&topic.id)
        .map(|v| VoteDetail {
            voter_code: v.voter_code.clone(),
            voter_name: display_name(repo, &v.voter_code),
            score: v.score,
        })
        .collect();
    let scores: Vec<f64> = votes.iter().map(|v| v.score).collect();

    TopicStats {
        topic_id: topic.id.clone(),
        text: topic.text.clone(),
        presenter_name: display_name(repo, &topic.presenter_code),
        mean: mean_score(&scores),
        vote_count: votes.len(),
        star_count: repo.star_count_for_topic(&topic.id),
        votes,
    }
}

/// Stats for every topic of a class, in topic insertion order.
pub fn class_stats(repo: &Repository, class_id: &str) -> Vec<TopicStats> {
    repo.topics_in_class(class_id)
        .map(|t| topic_stats(repo, t))
        .collect()
}

/// Highest mean first. Ties keep their input order.
pub fn rank_by_score(stats: &[TopicStats]) -> Vec<TopicStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    ranked
}

/// Most stars first. Ties keep their input order.
pub fn rank_by_stars(stats: &[TopicStats]) -> Vec<TopicStats> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|a, b| b.star_count.cmp(&a.star_count));
    ranked
}
