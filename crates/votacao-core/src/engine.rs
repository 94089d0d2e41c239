//! Voting rule engine.
//!
//! Owns the repository and applies every mutation: votes, stars, content
//! replacement, topic maintenance, resets. Each successful mutation ends with
//! one save through the [`StorageAdapter`]; a failed save is logged and the
//! in-memory state stays authoritative.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::error::{Entity, Forbidden, VoteError, VoteResult};
use crate::identity::IdentityResolver;
use crate::model::{Question, Snapshot, Star, Topic, User, Vote};
use crate::parser::Seed;
use crate::report::ClassReport;
use crate::repository::Repository;
use crate::statistics::{class_stats, display_name};
use crate::traits::StorageAdapter;
use crate::views::{
    ClassWithPresenters, PresenterContent, PresenterEntry, PresenterListing, PresenterSummary,
    Profile, QuestionWithTopics, StarBoard, StarBoardTopic, StarUsage,
};

/// Scoring and quota rules.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// Voter codes allowed the extended score range.
    pub leader_codes: HashSet<String>,
    pub leader_max_score: u8,
    pub default_max_score: u8,
    /// Stars each voter may grant per class.
    pub star_quota: usize,
    /// Placeholder topics created per question on content replace.
    pub placeholder_topics: usize,
    /// Questions kept per presenter on content replace.
    pub max_questions: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            leader_codes: (1..=6).map(|c| c.to_string()).collect(),
            leader_max_score: 10,
            default_max_score: 5,
            star_quota: 5,
            placeholder_topics: 3,
            max_questions: 3,
        }
    }
}

impl RuleConfig {
    /// Highest score `voter_code` may give.
    pub fn max_score_for(&self, voter_code: &str) -> u8 {
        if self.leader_codes.contains(voter_code) {
            self.leader_max_score
        } else {
            self.default_max_score
        }
    }
}

/// Parse a raw score from a request body.
///
/// Accepts JSON numbers and numeric strings. Anything that is not a whole
/// number in `1..=max` fails with [`VoteError::InvalidRange`].
pub fn parse_score(raw: &Value, max: u8) -> VoteResult<u8> {
    let out_of_range = || VoteError::InvalidRange { max };
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(out_of_range)?;

    if n.fract() != 0.0 || n < 1.0 || n > f64::from(max) {
        return Err(out_of_range());
    }
    Ok(n as u8)
}

/// The central voting engine.
pub struct VotingEngine {
    repo: Repository,
    storage: Arc<dyn StorageAdapter>,
    identity: IdentityResolver,
    rules: RuleConfig,
    seed: Seed,
}

impl VotingEngine {
    /// Load persisted state, or build it from `seed` when storage is empty.
    pub async fn open(
        storage: Arc<dyn StorageAdapter>,
        seed: Seed,
        identity: IdentityResolver,
        rules: RuleConfig,
    ) -> Result<Self> {
        let (mut engine, seeded) = Self::load(storage, seed, identity, rules).await?;
        if seeded {
            engine.persist().await;
        }
        Ok(engine)
    }

    /// Like [`VotingEngine::open`], but state built from the seed is kept in
    /// memory only.
    pub async fn open_read_only(
        storage: Arc<dyn StorageAdapter>,
        seed: Seed,
        identity: IdentityResolver,
        rules: RuleConfig,
    ) -> Result<Self> {
        let (engine, _) = Self::load(storage, seed, identity, rules).await?;
        Ok(engine)
    }

    async fn load(
        storage: Arc<dyn StorageAdapter>,
        seed: Seed,
        identity: IdentityResolver,
        rules: RuleConfig,
    ) -> Result<(Self, bool)> {
        let loaded = storage
            .load()
            .await
            .with_context(|| format!("failed to load state from {} storage", storage.name()))?;

        let seeded = loaded.is_none();
        let repo = match loaded {
            Some(snapshot) => {
                tracing::info!(
                    "loaded {} users, {} topics, {} votes from {} storage",
                    snapshot.data.users.len(),
                    snapshot.data.topics.len(),
                    snapshot.data.votes.len(),
                    storage.name()
                );
                Repository::from_snapshot(snapshot)
            }
            None => {
                tracing::info!("storage is empty, building state from seed");
                seed.build()
            }
        };

        let mut engine = Self {
            repo,
            storage,
            identity,
            rules,
            seed,
        };
        engine.identity.derive_block_lists(engine.repo.users_mut());
        Ok((engine, seeded))
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    pub fn seed(&self) -> &Seed {
        &self.seed
    }

    pub fn snapshot(&self) -> Snapshot {
        self.repo.snapshot()
    }

    async fn persist(&self) {
        if let Err(e) = self.storage.save(&self.repo.snapshot()).await {
            tracing::error!("failed to persist state to {} storage: {e:#}", self.storage.name());
        }
    }

    fn find_user(&self, code: &str) -> VoteResult<&User> {
        self.repo
            .user(code)
            .ok_or_else(|| VoteError::not_found(Entity::User, code))
    }

    fn find_presenter(&self, code: &str) -> VoteResult<&User> {
        self.repo
            .user(code)
            .filter(|u| u.is_presenter)
            .ok_or_else(|| VoteError::not_found(Entity::Presenter, code))
    }

    fn owns(&self, voter: &User, topic: &Topic) -> bool {
        self.identity
            .is_self(voter, &topic.presenter_code, self.repo.user(&topic.presenter_code))
    }

    // -- queries -----------------------------------------------------------

    pub fn login(&self, code: &str) -> VoteResult<Profile> {
        self.find_user(code).map(Profile::from)
    }

    /// Every class with its participant presenters.
    pub fn classes_with_presenters(&self) -> Vec<ClassWithPresenters> {
        self.repo
            .classes()
            .iter()
            .map(|class| ClassWithPresenters {
                class: class.clone(),
                presenters: self
                    .repo
                    .presenters_in(&class.id)
                    .map(PresenterSummary::from)
                    .collect(),
            })
            .collect()
    }

    /// A presenter's questions by order, each with its topics in creation
    /// order.
    pub fn presenter_content(&self, code: &str) -> VoteResult<PresenterContent> {
        let presenter = self.find_presenter(code)?;
        let questions = self
            .repo
            .questions_of(&presenter.code)
            .into_iter()
            .map(|q| QuestionWithTopics {
                question: q.clone(),
                topics: self.repo.topics_of_question(&q.id).cloned().collect(),
            })
            .collect();

        Ok(PresenterContent {
            presenter: PresenterSummary::from(presenter),
            questions,
        })
    }

    /// All non-admin presenters plus the class list.
    pub fn list_presenters(&self) -> PresenterListing {
        PresenterListing {
            presenters: self
                .repo
                .users()
                .iter()
                .filter(|u| u.is_presenter && !u.is_admin())
                .map(|u| PresenterEntry {
                    code: u.code.clone(),
                    name: u.name.clone(),
                    class_id: u.class_id.clone(),
                    is_presenter: u.is_presenter,
                })
                .collect(),
            classes: self.repo.classes().to_vec(),
        }
    }

    /// Star usage and per-topic eligibility for one voter in one class.
    pub fn star_board(&self, class_id: &str, voter_code: &str) -> VoteResult<StarBoard> {
        let voter = self.find_user(voter_code)?;
        let class = self
            .repo
            .class(class_id)
            .ok_or_else(|| VoteError::not_found(Entity::Class, class_id))?;

        let usage = StarUsage {
            used: self.repo.stars_of(&voter.code, &class.id).count(),
            quota: self.rules.star_quota,
        };

        let topics = self
            .repo
            .topics_in_class(&class.id)
            .map(|t| {
                let already_starred = self.repo.has_star(&voter.code, &t.id);
                let own_topic = self.owns(voter, t);
                StarBoardTopic {
                    id: t.id.clone(),
                    text: t.text.clone(),
                    presenter_name: display_name(&self.repo, &t.presenter_code),
                    already_starred,
                    own_topic,
                    can_star: !already_starred && !own_topic && !usage.exhausted(),
                }
            })
            .collect();

        Ok(StarBoard {
            class: class.clone(),
            usage,
            topics,
        })
    }

    /// Per-topic stats of a class, ranked by mean and by stars.
    pub fn class_report(&self, class_id: &str) -> VoteResult<ClassReport> {
        let class = self
            .repo
            .class(class_id)
            .ok_or_else(|| VoteError::not_found(Entity::Class, class_id))?;
        Ok(ClassReport::new(class.clone(), class_stats(&self.repo, class_id)))
    }

    // -- voting ------------------------------------------------------------

    /// Record or overwrite a vote. Returns `true` when an earlier vote by the
    /// same voter on the same topic was overwritten.
    pub async fn cast_vote(
        &mut self,
        voter_code: &str,
        topic_id: &str,
        raw_score: &Value,
    ) -> VoteResult<bool> {
        let voter = self.find_user(voter_code)?;
        let topic = self
            .repo
            .topic(topic_id)
            .ok_or_else(|| VoteError::not_found(Entity::Topic, topic_id))?;

        let score = parse_score(raw_score, self.rules.max_score_for(&voter.code))?;

        if self.owns(voter, topic) {
            return Err(VoteError::Forbidden(Forbidden::OwnTopic));
        }

        let vote = Vote {
            voter_code: voter.code.clone(),
            topic_id: topic.id.clone(),
            score: f64::from(score),
        };
        let overwritten = self.repo.upsert_vote(vote);
        tracing::debug!(voter = voter_code, topic = topic_id, score, overwritten, "vote recorded");

        self.persist().await;
        Ok(overwritten)
    }

    /// Grant a star. Checks run in a fixed order: ownership, quota, duplicate.
    pub async fn grant_star(
        &mut self,
        voter_code: &str,
        class_id: &str,
        topic_id: &str,
    ) -> VoteResult<()> {
        let voter = self.find_user(voter_code)?;
        let class = self
            .repo
            .class(class_id)
            .ok_or_else(|| VoteError::not_found(Entity::Class, class_id))?;
        let topic = self
            .repo
            .topic(topic_id)
            .filter(|t| t.class_id == class.id)
            .ok_or_else(|| VoteError::not_found(Entity::Topic, topic_id))?;

        if self.owns(voter, topic) {
            return Err(VoteError::Forbidden(Forbidden::OwnTopic));
        }
        let quota = self.rules.star_quota;
        if self.repo.stars_of(&voter.code, &class.id).count() >= quota {
            return Err(VoteError::Forbidden(Forbidden::QuotaExhausted { quota }));
        }
        if self.repo.has_star(&voter.code, &topic.id) {
            return Err(VoteError::Forbidden(Forbidden::DuplicateStar));
        }

        let star = Star {
            voter_code: voter.code.clone(),
            class_id: class.id.clone(),
            topic_id: topic.id.clone(),
        };
        self.repo.insert_star(star);
        tracing::debug!(voter = voter_code, class = class_id, topic = topic_id, "star granted");

        self.persist().await;
        Ok(())
    }

    // -- admin content -----------------------------------------------------

    /// Replace a presenter's questions with the non-blank lines of `text`,
    /// each getting placeholder topics. Returns the new questions.
    pub async fn replace_content(
        &mut self,
        presenter_code: &str,
        text: &str,
    ) -> VoteResult<Vec<Question>> {
        let presenter = self.find_presenter(presenter_code)?.clone();
        let class_id = presenter
            .class_id
            .clone()
            .ok_or_else(|| VoteError::missing("turmaId"))?;

        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(self.rules.max_questions)
            .collect();

        let (old_questions, old_topics) = self.repo.delete_questions_of(&presenter.code);

        let mut created = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let question = self
                .repo
                .insert_question(&class_id, &presenter.code, line, idx as u32 + 1);
            for i in 1..=self.rules.placeholder_topics {
                let placeholder =
                    format!("Tópico {}.{} – {}", question.order, i, presenter.name);
                self.repo.insert_topic(&question, &placeholder);
            }
            created.push(question);
        }

        tracing::info!(
            "replaced content of presenter {}: {} questions/{} topics removed, {} questions created",
            presenter.code,
            old_questions.len(),
            old_topics.len(),
            created.len()
        );

        self.persist().await;
        Ok(created)
    }

    pub async fn add_topic(&mut self, question_id: &str, text: &str) -> VoteResult<Topic> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoteError::missing("texto"));
        }
        let question = self
            .repo
            .question(question_id)
            .cloned()
            .ok_or_else(|| VoteError::not_found(Entity::Question, question_id))?;

        let topic = self.repo.insert_topic(&question, text);
        self.persist().await;
        Ok(topic)
    }

    pub async fn edit_topic(&mut self, topic_id: &str, text: &str) -> VoteResult<Topic> {
        let text = text.trim();
        if text.is_empty() {
            return Err(VoteError::missing("texto"));
        }
        let topic = self
            .repo
            .topic_mut(topic_id)
            .ok_or_else(|| VoteError::not_found(Entity::Topic, topic_id))?;
        topic.text = text.to_string();
        let topic = topic.clone();

        self.persist().await;
        Ok(topic)
    }

    /// Remove a topic. Its votes and stars stay until the next reset.
    pub async fn delete_topic(&mut self, topic_id: &str) -> VoteResult<Topic> {
        let topic = self
            .repo
            .delete_topic(topic_id)
            .ok_or_else(|| VoteError::not_found(Entity::Topic, topic_id))?;
        self.persist().await;
        Ok(topic)
    }

    // -- resets ------------------------------------------------------------

    /// Clear every vote and star.
    pub async fn reset_votes(&mut self) {
        let (votes, stars) = (self.repo.votes().len(), self.repo.stars().len());
        self.repo.clear_votes_and_stars();
        tracing::info!("reset: cleared {votes} votes and {stars} stars");
        self.persist().await;
    }

    /// Throw away all state and rebuild it from `seed`.
    pub async fn reseed(&mut self, seed: Seed) {
        self.repo = seed.build();
        self.identity.derive_block_lists(self.repo.users_mut());
        self.seed = seed;
        tracing::info!(
            "reseeded: {} users, {} topics",
            self.repo.users().len(),
            self.repo.topics().len()
        );
        self.persist().await;
    }
}

impl std::fmt::Debug for VotingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingEngine")
            .field("storage", &self.storage.name())
            .field("identity", &self.identity)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{ExactNameMatcher, IdentityStrategy};
    use crate::parser::default_seed;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every saved snapshot.
    #[derive(Default)]
    struct RecordingStorage {
        initial: Option<Snapshot>,
        saves: Mutex<Vec<Snapshot>>,
    }

    impl RecordingStorage {
        fn save_count(&self) -> usize {
            self.saves.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StorageAdapter for RecordingStorage {
        fn name(&self) -> &str {
            "recording"
        }

        async fn load(&self) -> anyhow::Result<Option<Snapshot>> {
            Ok(self.initial.clone())
        }

        async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
            self.saves.lock().unwrap().push(snapshot.clone());
            Ok(())
        }
    }

    struct BrokenStorage;

    #[async_trait]
    impl StorageAdapter for BrokenStorage {
        fn name(&self) -> &str {
            "broken"
        }

        async fn load(&self) -> anyhow::Result<Option<Snapshot>> {
            Ok(None)
        }

        async fn save(&self, _: &Snapshot) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    async fn engine_with(storage: Arc<RecordingStorage>) -> VotingEngine {
        VotingEngine::open(
            storage,
            default_seed().unwrap(),
            IdentityResolver::default(),
            RuleConfig::default(),
        )
        .await
        .unwrap()
    }

    async fn engine() -> VotingEngine {
        engine_with(Arc::new(RecordingStorage::default())).await
    }

    /// First topic presented by `code`.
    fn first_topic_of(engine: &VotingEngine, code: &str) -> String {
        engine
            .repository()
            .topics()
            .iter()
            .find(|t| t.presenter_code == code)
            .map(|t| t.id.clone())
            .unwrap()
    }

    #[test]
    fn parse_score_bounds() {
        assert_eq!(parse_score(&json!(5), 5).unwrap(), 5);
        assert_eq!(parse_score(&json!("3"), 5).unwrap(), 3);
        assert_eq!(parse_score(&json!(10.0), 10).unwrap(), 10);
        assert!(matches!(parse_score(&json!(0), 5), Err(VoteError::InvalidRange { max: 5 })));
        assert!(parse_score(&json!(6), 5).is_err());
        assert!(parse_score(&json!(4.5), 5).is_err());
        assert!(parse_score(&json!("abc"), 5).is_err());
        assert!(parse_score(&json!(true), 5).is_err());
        assert!(parse_score(&json!(-1), 10).is_err());
    }

    #[test]
    fn leader_range() {
        let rules = RuleConfig::default();
        assert_eq!(rules.max_score_for("1"), 10);
        assert_eq!(rules.max_score_for("6"), 10);
        assert_eq!(rules.max_score_for("7"), 5);
        assert_eq!(rules.max_score_for("1000"), 5);
    }

    #[tokio::test]
    async fn open_seeds_and_persists_once() {
        let storage = Arc::new(RecordingStorage::default());
        let engine = engine_with(storage.clone()).await;
        assert_eq!(storage.save_count(), 1);
        assert_eq!(engine.repository().classes().len(), 2);
        assert!(engine.repository().user("100").unwrap().is_admin());
        assert_eq!(engine.identity().matcher_name(), "overlap");
    }

    #[tokio::test]
    async fn read_only_open_never_saves() {
        let storage = Arc::new(RecordingStorage::default());
        let engine = VotingEngine::open_read_only(
            storage.clone(),
            default_seed().unwrap(),
            IdentityResolver::default(),
            RuleConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(storage.save_count(), 0);
        assert_eq!(engine.repository().classes().len(), 2);
        assert_eq!(engine.repository().user("8").unwrap().blocked_presenters, vec!["1000"]);
    }

    #[tokio::test]
    async fn open_loads_existing_state() {
        let seeded = engine().await.snapshot();
        let mut snapshot = seeded.clone();
        snapshot.data.votes.push(Vote {
            voter_code: "1".into(),
            topic_id: "1".into(),
            score: 7.0,
        });
        let storage = Arc::new(RecordingStorage {
            initial: Some(snapshot),
            ..Default::default()
        });
        let engine = engine_with(storage.clone()).await;
        assert_eq!(storage.save_count(), 0);
        assert_eq!(engine.repository().votes().len(), 1);
    }

    #[tokio::test]
    async fn decimal_scores_from_older_state_count_in_reports() {
        let seeded = engine().await;
        let topic = first_topic_of(&seeded, "1000");
        let mut snapshot = seeded.snapshot();
        for (voter, score) in [("1", 4.5), ("20", 5.0)] {
            snapshot.data.votes.push(Vote {
                voter_code: voter.into(),
                topic_id: topic.clone(),
                score,
            });
        }
        let storage = Arc::new(RecordingStorage {
            initial: Some(snapshot),
            ..Default::default()
        });
        let engine = engine_with(storage).await;

        let report = engine.class_report("M").unwrap();
        let stats = report.by_score.iter().find(|s| s.topic_id == topic).unwrap();
        assert_eq!(stats.vote_count, 2);
        assert!((stats.mean - 4.75).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn self_vote_is_forbidden() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        let err = engine.cast_vote("8", &topic, &json!(5)).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::OwnTopic)));

        // Presenter account voting on their own topic by code
        let err = engine.cast_vote("1000", &topic, &json!(3)).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::OwnTopic)));
    }

    #[tokio::test]
    async fn leader_may_score_ten() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        assert!(!engine.cast_vote("1", &topic, &json!(10)).await.unwrap());
        assert_eq!(engine.repository().vote("1", &topic).unwrap().score, 10.0);
    }

    #[tokio::test]
    async fn regular_voter_above_five_is_invalid() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        let err = engine.cast_vote("20", &topic, &json!(6)).await.unwrap_err();
        assert!(matches!(err, VoteError::InvalidRange { max: 5 }));
        assert!(engine.repository().votes().is_empty());
    }

    #[tokio::test]
    async fn revote_overwrites() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        engine.cast_vote("20", &topic, &json!(2)).await.unwrap();
        assert!(engine.cast_vote("20", &topic, &json!(4)).await.unwrap());
        assert_eq!(engine.repository().votes().len(), 1);
        assert_eq!(engine.repository().vote("20", &topic).unwrap().score, 4.0);
    }

    #[tokio::test]
    async fn vote_lookups_fail_before_range() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        let err = engine.cast_vote("nobody", &topic, &json!(99)).await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound { entity: Entity::User, .. }));
        let err = engine.cast_vote("20", "99999", &json!(99)).await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound { entity: Entity::Topic, .. }));
    }

    #[tokio::test]
    async fn range_is_checked_before_ownership() {
        let mut engine = engine().await;
        let topic = first_topic_of(&engine, "1000");
        let err = engine.cast_vote("8", &topic, &json!(9)).await.unwrap_err();
        assert!(matches!(err, VoteError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn name_match_blocks_voter() {
        let mut engine = engine().await;
        let code = engine
            .repository()
            .users()
            .iter()
            .find(|u| u.is_presenter && u.name.starts_with("Humberto"))
            .map(|u| u.code.clone())
            .unwrap();
        let topic = first_topic_of(&engine, &code);
        let err = engine.cast_vote("17", &topic, &json!(5)).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(_)));
    }

    #[tokio::test]
    async fn star_quota_and_duplicates() {
        let mut engine = engine().await;
        let topics: Vec<String> = engine
            .repository()
            .topics_in_class("T")
            .map(|t| t.id.clone())
            .take(6)
            .collect();

        for t in &topics[..5] {
            engine.grant_star("1", "T", t).await.unwrap();
        }
        let err = engine.grant_star("1", "T", &topics[5]).await.unwrap_err();
        assert!(matches!(
            err,
            VoteError::Forbidden(Forbidden::QuotaExhausted { quota: 5 })
        ));
        // Quota wins over duplicate
        let err = engine.grant_star("1", "T", &topics[0]).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::QuotaExhausted { .. })));

        engine.grant_star("2", "T", &topics[0]).await.unwrap();
        let err = engine.grant_star("2", "T", &topics[0]).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::DuplicateStar)));

        // Quota is per class
        let morning = engine.repository().topics_in_class("M").nth(3).unwrap().id.clone();
        engine.grant_star("1", "M", &morning).await.unwrap();
    }

    #[tokio::test]
    async fn star_checks_ownership_and_class() {
        let mut engine = engine().await;
        let own = first_topic_of(&engine, "1000");
        let err = engine.grant_star("8", "M", &own).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::OwnTopic)));

        let err = engine.grant_star("1", "T", &own).await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound { entity: Entity::Topic, .. }));
        let err = engine.grant_star("1", "X", &own).await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound { entity: Entity::Class, .. }));
    }

    #[tokio::test]
    async fn star_board_flags() {
        let mut engine = engine().await;
        let own = first_topic_of(&engine, "1000");
        let other = first_topic_of(&engine, "1001");
        engine.grant_star("8", "M", &other).await.unwrap();

        let board = engine.star_board("M", "8").unwrap();
        assert_eq!(board.usage, StarUsage { used: 1, quota: 5 });
        let own_row = board.topics.iter().find(|t| t.id == own).unwrap();
        assert!(own_row.own_topic && !own_row.can_star);
        let starred = board.topics.iter().find(|t| t.id == other).unwrap();
        assert!(starred.already_starred && !starred.can_star);
        assert_eq!(starred.presenter_name, "Ursula");

        assert!(engine.star_board("M", "nobody").is_err());
        assert!(engine.star_board("Z", "8").is_err());
    }

    #[tokio::test]
    async fn replace_content_creates_placeholders() {
        let mut engine = engine().await;
        let created = engine
            .replace_content("1000", "  Primeira pergunta \n\n Segunda\n")
            .await
            .unwrap();
        assert_eq!(created.len(), 2);

        let repo = engine.repository();
        let questions = repo.questions_of("1000");
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].text, "Primeira pergunta");
        assert_eq!(questions[1].order, 2);

        let topics: Vec<&Topic> = repo.topics().iter().filter(|t| t.presenter_code == "1000").collect();
        assert_eq!(topics.len(), 6);
        assert_eq!(topics[0].text, "Tópico 1.1 – Thaynara");
        assert_eq!(topics[5].text, "Tópico 2.3 – Thaynara");
        assert!(topics.iter().all(|t| t.class_id == "M"));
    }

    #[tokio::test]
    async fn replace_content_caps_and_validates() {
        let mut engine = engine().await;
        let created = engine.replace_content("1001", "a\nb\nc\nd\ne").await.unwrap();
        assert_eq!(created.len(), 3);

        let err = engine.replace_content("8", "a").await.unwrap_err();
        assert!(matches!(err, VoteError::NotFound { entity: Entity::Presenter, .. }));

        let mut orphan = User::presenter("2000", "Sem Turma", "M");
        orphan.class_id = None;
        engine.repo.upsert_user(orphan);
        let err = engine.replace_content("2000", "a").await.unwrap_err();
        assert!(matches!(err, VoteError::MissingField(ref f) if f == "turmaId"));
    }

    #[tokio::test]
    async fn topic_maintenance() {
        let mut engine = engine().await;
        let question = engine.repository().questions_of("1000")[0].id.clone();

        let topic = engine.add_topic(&question, "  Novo tópico ").await.unwrap();
        assert_eq!(topic.text, "Novo tópico");
        assert_eq!(topic.presenter_code, "1000");
        assert_eq!(topic.class_id, "M");

        let edited = engine.edit_topic(&topic.id, "Editado").await.unwrap();
        assert_eq!(edited.text, "Editado");
        assert!(matches!(
            engine.edit_topic(&topic.id, "  ").await,
            Err(VoteError::MissingField(_))
        ));
        assert!(matches!(
            engine.add_topic("99999", "x").await,
            Err(VoteError::NotFound { entity: Entity::Question, .. })
        ));

        engine.cast_vote("20", &topic.id, &json!(4)).await.unwrap();
        engine.delete_topic(&topic.id).await.unwrap();
        assert!(engine.repository().topic(&topic.id).is_none());
        assert_eq!(engine.repository().votes().len(), 1);
        assert!(engine.delete_topic(&topic.id).await.is_err());
    }

    #[tokio::test]
    async fn presenter_content_and_listing() {
        let engine = engine().await;
        let content = engine.presenter_content("1000").unwrap();
        assert_eq!(content.presenter.name, "Thaynara");
        assert!(content.questions.windows(2).all(|w| w[0].question.order < w[1].question.order));
        assert!(!content.questions[0].topics.is_empty());
        assert!(engine.presenter_content("8").is_err());

        let listing = engine.list_presenters();
        assert_eq!(listing.presenters.len(), 25);
        assert_eq!(listing.classes.len(), 2);

        let classes = engine.classes_with_presenters();
        let total: usize = classes.iter().map(|c| c.presenters.len()).sum();
        assert_eq!(total, 25);
    }

    #[tokio::test]
    async fn login_and_report() {
        let mut engine = engine().await;
        let profile = engine.login("8").unwrap();
        assert_eq!(profile.name, "Thaynara");
        assert!(!profile.is_presenter);
        assert!(matches!(engine.login("nope"), Err(VoteError::NotFound { .. })));

        let topic = first_topic_of(&engine, "1000");
        engine.cast_vote("1", &topic, &json!(10)).await.unwrap();
        engine.cast_vote("20", &topic, &json!(5)).await.unwrap();

        let report = engine.class_report("M").unwrap();
        assert_eq!(report.by_score[0].topic_id, topic);
        assert!((report.by_score[0].mean - 7.5).abs() < f64::EPSILON);

        assert!(matches!(
            engine.class_report("X"),
            Err(VoteError::NotFound { entity: Entity::Class, .. })
        ));
    }

    #[tokio::test]
    async fn reset_and_reseed() {
        let storage = Arc::new(RecordingStorage::default());
        let mut engine = engine_with(storage.clone()).await;
        let topic = first_topic_of(&engine, "1000");
        engine.cast_vote("1", &topic, &json!(3)).await.unwrap();
        engine.grant_star("1", "M", &topic).await.unwrap();

        engine.reset_votes().await;
        assert!(engine.repository().votes().is_empty());
        assert!(engine.repository().stars().is_empty());

        engine.replace_content("1000", "x").await.unwrap();
        let seed = engine.seed().clone();
        engine.reseed(seed).await;
        assert_eq!(engine.repository().questions_of("1000").len(), 3);
        assert_eq!(engine.repository().questions()[0].id, "1");
        assert_eq!(storage.save_count(), 6);
    }

    #[tokio::test]
    async fn failed_save_keeps_memory_state() {
        let mut engine = VotingEngine::open(
            Arc::new(BrokenStorage),
            default_seed().unwrap(),
            IdentityResolver::new(IdentityStrategy::Overlap.matcher()),
            RuleConfig::default(),
        )
        .await
        .unwrap();
        let topic = first_topic_of(&engine, "1000");
        engine.cast_vote("1", &topic, &json!(4)).await.unwrap();
        assert_eq!(engine.repository().votes().len(), 1);
    }

    #[tokio::test]
    async fn exact_strategy_ignores_overlap() {
        let mut engine = VotingEngine::open(
            Arc::new(RecordingStorage::default()),
            default_seed().unwrap(),
            IdentityResolver::new(Box::new(ExactNameMatcher)),
            RuleConfig::default(),
        )
        .await
        .unwrap();
        let code = engine
            .repository()
            .users()
            .iter()
            .find(|u| u.is_presenter && u.name == "Thiago Meller")
            .map(|u| u.code.clone())
            .unwrap();
        let topic = first_topic_of(&engine, &code);
        engine.cast_vote("15", &topic, &json!(5)).await.unwrap();
        let err = engine.cast_vote("29", &topic, &json!(5)).await.unwrap_err();
        assert!(matches!(err, VoteError::Forbidden(Forbidden::OwnTopic)));
    }
}
