use criterion::{black_box, criterion_group, criterion_main, Criterion};

use votacao_core::model::{Star, Vote};
use votacao_core::parser::default_seed;
use votacao_core::repository::Repository;
use votacao_core::statistics::{class_stats, rank_by_score, rank_by_stars};

/// Default seed with every voter scoring every topic of the morning class
/// and spending their stars on the first five.
fn populated() -> Repository {
    let mut repo = default_seed().expect("embedded seed parses").build();
    let voters: Vec<String> = repo
        .users()
        .iter()
        .filter(|u| !u.is_presenter && !u.is_admin())
        .map(|u| u.code.clone())
        .collect();
    let topics: Vec<String> = repo.topics_in_class("M").map(|t| t.id.clone()).collect();

    for (vi, voter) in voters.iter().enumerate() {
        for (ti, topic) in topics.iter().enumerate() {
            repo.upsert_vote(Vote {
                voter_code: voter.clone(),
                topic_id: topic.clone(),
                score: ((vi + ti) % 5 + 1) as f64,
            });
        }
        for topic in topics.iter().skip(vi % 7).take(5) {
            repo.insert_star(Star {
                voter_code: voter.clone(),
                class_id: "M".into(),
                topic_id: topic.clone(),
            });
        }
    }
    repo
}

fn bench_rankings(c: &mut Criterion) {
    let repo = populated();
    let stats = class_stats(&repo, "M");

    let mut group = c.benchmark_group("ranking");

    group.bench_function("class_stats", |b| b.iter(|| class_stats(black_box(&repo), "M")));
    group.bench_function("rank_by_score", |b| b.iter(|| rank_by_score(black_box(&stats))));
    group.bench_function("rank_by_stars", |b| b.iter(|| rank_by_stars(black_box(&stats))));

    group.finish();
}

criterion_group!(benches, bench_rankings);
criterion_main!(benches);
