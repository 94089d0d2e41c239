//! Flat export rows.
//!
//! Votes and stars whose topic was deleted are skipped. Names that no longer
//! resolve are exported as empty strings.

use serde::Serialize;

use votacao_core::model::Topic;
use votacao_core::repository::Repository;
use votacao_core::statistics::topic_stats;

/// One line of the per-topic summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryRow {
    pub turma: String,
    pub topico_id: String,
    pub topico: String,
    pub apresentador: String,
    pub media_notas: f64,
    pub qtde_votos: usize,
    pub total_estrelas: usize,
}

/// One vote with its topic context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoteRow {
    pub turma: String,
    pub topico_id: String,
    pub topico: String,
    pub apresentador: String,
    pub votante_codigo: String,
    pub votante_nome: String,
    #[serde(serialize_with = "votacao_core::model::score::serialize")]
    pub nota: f64,
}

/// One star with its topic context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StarRow {
    pub turma: String,
    pub topico_id: String,
    pub topico: String,
    pub apresentador: String,
    pub votante_codigo: String,
    pub votante_nome: String,
}

fn class_name(repo: &Repository, class_id: &str) -> String {
    repo.class(class_id).map(|c| c.name.clone()).unwrap_or_default()
}

fn user_name(repo: &Repository, code: &str) -> String {
    repo.user(code).map(|u| u.name.clone()).unwrap_or_default()
}

/// Every topic, in insertion order, with its aggregates.
pub fn summary_rows(repo: &Repository) -> Vec<SummaryRow> {
    repo.topics()
        .iter()
        .map(|t| {
            let stats = topic_stats(repo, t);
            SummaryRow {
                turma: class_name(repo, &t.class_id),
                topico_id: t.id.clone(),
                topico: t.text.clone(),
                apresentador: user_name(repo, &t.presenter_code),
                media_notas: stats.mean,
                qtde_votos: stats.vote_count,
                total_estrelas: stats.star_count,
            }
        })
        .collect()
}

/// Context columns shared by vote and star rows.
struct TopicContext {
    turma: String,
    topico_id: String,
    topico: String,
    apresentador: String,
}

fn context(repo: &Repository, topic: &Topic) -> TopicContext {
    TopicContext {
        turma: class_name(repo, &topic.class_id),
        topico_id: topic.id.clone(),
        topico: topic.text.clone(),
        apresentador: user_name(repo, &topic.presenter_code),
    }
}

pub fn vote_rows(repo: &Repository) -> Vec<VoteRow> {
    repo.votes()
        .iter()
        .filter_map(|v| {
            let ctx = context(repo, repo.topic(&v.topic_id)?);
            Some(VoteRow {
                turma: ctx.turma,
                topico_id: ctx.topico_id,
                topico: ctx.topico,
                apresentador: ctx.apresentador,
                votante_codigo: v.voter_code.clone(),
                votante_nome: user_name(repo, &v.voter_code),
                nota: v.score,
            })
        })
        .collect()
}

pub fn star_rows(repo: &Repository) -> Vec<StarRow> {
    repo.stars()
        .iter()
        .filter_map(|s| {
            let ctx = context(repo, repo.topic(&s.topic_id)?);
            Some(StarRow {
                turma: ctx.turma,
                topico_id: ctx.topico_id,
                topico: ctx.topico,
                apresentador: ctx.apresentador,
                votante_codigo: s.voter_code.clone(),
                votante_nome: user_name(repo, &s.voter_code),
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use votacao_core::model::{Class, Star, User, Vote};

    /// Two topics, two votes, one star, plus a vote and a star on a deleted
    /// topic.
    pub(crate) fn fixture() -> Repository {
        let mut repo = Repository::new();
        repo.upsert_class(Class::new("M", "Manhã"));
        repo.upsert_user(User::presenter("1000", "Thaynara", "M"));
        repo.upsert_user(User::participant("1", "Alexandre"));
        let q = repo.insert_question("M", "1000", "Q", 1);
        let a = repo.insert_topic(&q, "Aquisição");
        let b = repo.insert_topic(&q, "Jornadas");
        let gone = repo.insert_topic(&q, "Removido");

        for (voter, topic, score) in [("1", &a.id, 9.0), ("77", &a.id, 4.5), ("1", &gone.id, 2.0)] {
            repo.upsert_vote(Vote {
                voter_code: voter.into(),
                topic_id: topic.clone(),
                score,
            });
        }
        for topic in [&b.id, &gone.id] {
            repo.insert_star(Star {
                voter_code: "1".into(),
                class_id: "M".into(),
                topic_id: topic.clone(),
            });
        }
        repo.delete_topic(&gone.id);
        repo
    }

    #[test]
    fn summary_covers_every_topic() {
        let rows = summary_rows(&fixture());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].turma, "Manhã");
        assert_eq!(rows[0].apresentador, "Thaynara");
        assert!((rows[0].media_notas - 6.75).abs() < f64::EPSILON);
        assert_eq!(rows[0].qtde_votos, 2);
        assert_eq!(rows[1].total_estrelas, 1);
    }

    #[test]
    fn orphans_are_skipped() {
        let repo = fixture();
        let votes = vote_rows(&repo);
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].votante_nome, "Alexandre");
        assert_eq!(votes[1].votante_nome, "");

        let stars = star_rows(&repo);
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].topico, "Jornadas");
    }

    #[test]
    fn rows_serialize_with_sheet_headers() {
        let json = serde_json::to_value(&summary_rows(&fixture())[0]).unwrap();
        assert!(json.get("MediaNotas").is_some());
        assert!(json.get("TopicoId").is_some());
        assert!(json.get("QtdeVotos").is_some());

        let votes = vote_rows(&fixture());
        assert_eq!(serde_json::to_value(&votes[0]).unwrap()["Nota"], 9);
        assert_eq!(serde_json::to_value(&votes[1]).unwrap()["Nota"], 4.5);
    }
}
