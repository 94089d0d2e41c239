//! In-memory repository over every entity collection.
//!
//! Lookups are linear scans over `Vec`s: the whole session holds a few
//! hundred rows, and vectors keep insertion order, which is the order topics
//! and questions are listed in.

use crate::model::{Class, Collections, Question, Snapshot, Star, Topic, User, Vote};

/// Sequential id source for questions and topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdAllocator {
    next_question: u64,
    next_topic: u64,
}

impl IdAllocator {
    pub fn new(next_question: u64, next_topic: u64) -> Self {
        Self {
            next_question: next_question.max(1),
            next_topic: next_topic.max(1),
        }
    }

    pub fn next_question_id(&mut self) -> String {
        let id = self.next_question;
        self.next_question += 1;
        id.to_string()
    }

    pub fn next_topic_id(&mut self) -> String {
        let id = self.next_topic;
        self.next_topic += 1;
        id.to_string()
    }

    /// Move counters past any numeric id already in `data`, so a hand-edited
    /// document cannot make the allocator hand out a duplicate.
    fn catch_up(&mut self, data: &Collections) {
        let max_q = max_numeric_id(data.questions.iter().map(|q| q.id.as_str()));
        let max_t = max_numeric_id(data.topics.iter().map(|t| t.id.as_str()));
        self.next_question = self.next_question.max(max_q + 1);
        self.next_topic = self.next_topic.max(max_t + 1);
    }
}

fn max_numeric_id<'a>(ids: impl Iterator<Item = &'a str>) -> u64 {
    ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0)
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// All entities plus the id allocator.
#[derive(Debug, Clone, Default)]
pub struct Repository {
    data: Collections,
    ids: IdAllocator,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut ids = IdAllocator::new(snapshot.next_question_id, snapshot.next_topic_id);
        ids.catch_up(&snapshot.data);
        Self {
            data: snapshot.data,
            ids,
        }
    }

    /// A full copy of the current state, ready to persist.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            data: self.data.clone(),
            next_question_id: self.ids.next_question,
            next_topic_id: self.ids.next_topic,
        }
    }

    pub fn collections(&self) -> &Collections {
        &self.data
    }

    // -- users -------------------------------------------------------------

    pub fn user(&self, code: &str) -> Option<&User> {
        self.data.users.iter().find(|u| u.code == code)
    }

    pub fn users(&self) -> &[User] {
        &self.data.users
    }

    pub fn users_mut(&mut self) -> &mut [User] {
        &mut self.data.users
    }

    /// Insert or replace by code. Returns `true` when an existing user was
    /// replaced.
    pub fn upsert_user(&mut self, user: User) -> bool {
        match self.data.users.iter_mut().find(|u| u.code == user.code) {
            Some(existing) => {
                *existing = user;
                true
            }
            None => {
                self.data.users.push(user);
                false
            }
        }
    }

    pub fn delete_user(&mut self, code: &str) -> Option<User> {
        let idx = self.data.users.iter().position(|u| u.code == code)?;
        Some(self.data.users.remove(idx))
    }

    /// Presenters of a class, in insertion order.
    pub fn presenters_in<'a>(&'a self, class_id: &'a str) -> impl Iterator<Item = &'a User> {
        self.data.users.iter().filter(move |u| {
            !u.is_admin() && u.is_presenter && u.class_id.as_deref() == Some(class_id)
        })
    }

    // -- classes -----------------------------------------------------------

    pub fn class(&self, id: &str) -> Option<&Class> {
        self.data.classes.iter().find(|c| c.id == id)
    }

    pub fn classes(&self) -> &[Class] {
        &self.data.classes
    }

    pub fn upsert_class(&mut self, class: Class) -> bool {
        match self.data.classes.iter_mut().find(|c| c.id == class.id) {
            Some(existing) => {
                *existing = class;
                true
            }
            None => {
                self.data.classes.push(class);
                false
            }
        }
    }

    pub fn delete_class(&mut self, id: &str) -> Option<Class> {
        let idx = self.data.classes.iter().position(|c| c.id == id)?;
        Some(self.data.classes.remove(idx))
    }

    // -- questions ---------------------------------------------------------

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.data.questions.iter().find(|q| q.id == id)
    }

    pub fn questions(&self) -> &[Question] {
        &self.data.questions
    }

    /// A presenter's questions sorted by their order index.
    pub fn questions_of(&self, presenter_code: &str) -> Vec<&Question> {
        let mut questions: Vec<&Question> = self
            .data
            .questions
            .iter()
            .filter(|q| q.presenter_code == presenter_code)
            .collect();
        questions.sort_by_key(|q| q.order);
        questions
    }

    /// Create a question with a freshly allocated id.
    pub fn insert_question(
        &mut self,
        class_id: &str,
        presenter_code: &str,
        text: &str,
        order: u32,
    ) -> Question {
        let question = Question {
            id: self.ids.next_question_id(),
            class_id: class_id.to_string(),
            presenter_code: presenter_code.to_string(),
            text: text.to_string(),
            order,
        };
        self.data.questions.push(question.clone());
        question
    }

    /// Remove a presenter's questions together with their topics.
    pub fn delete_questions_of(&mut self, presenter_code: &str) -> (Vec<Question>, Vec<Topic>) {
        let (removed, kept): (Vec<Question>, Vec<Question>) =
            std::mem::take(&mut self.data.questions)
                .into_iter()
                .partition(|q| q.presenter_code == presenter_code);
        self.data.questions = kept;

        let (orphaned, topics): (Vec<Topic>, Vec<Topic>) = std::mem::take(&mut self.data.topics)
            .into_iter()
            .partition(|t| removed.iter().any(|q| q.id == t.question_id));
        self.data.topics = topics;

        (removed, orphaned)
    }

    // -- topics ------------------------------------------------------------

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.data.topics.iter().find(|t| t.id == id)
    }

    pub fn topic_mut(&mut self, id: &str) -> Option<&mut Topic> {
        self.data.topics.iter_mut().find(|t| t.id == id)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.data.topics
    }

    pub fn topics_in_class<'a>(&'a self, class_id: &'a str) -> impl Iterator<Item = &'a Topic> {
        self.data.topics.iter().filter(move |t| t.class_id == class_id)
    }

    pub fn topics_of_question<'a>(
        &'a self,
        question_id: &'a str,
    ) -> impl Iterator<Item = &'a Topic> {
        self.data
            .topics
            .iter()
            .filter(move |t| t.question_id == question_id)
    }

    /// Create a topic under `question`, copying its class and presenter.
    pub fn insert_topic(&mut self, question: &Question, text: &str) -> Topic {
        let topic = Topic {
            id: self.ids.next_topic_id(),
            question_id: question.id.clone(),
            class_id: question.class_id.clone(),
            presenter_code: question.presenter_code.clone(),
            text: text.to_string(),
        };
        self.data.topics.push(topic.clone());
        topic
    }

    pub fn delete_topic(&mut self, id: &str) -> Option<Topic> {
        let idx = self.data.topics.iter().position(|t| t.id == id)?;
        Some(self.data.topics.remove(idx))
    }

    // -- votes -------------------------------------------------------------

    pub fn vote(&self, voter_code: &str, topic_id: &str) -> Option<&Vote> {
        self.data
            .votes
            .iter()
            .find(|v| v.voter_code == voter_code && v.topic_id == topic_id)
    }

    pub fn votes(&self) -> &[Vote] {
        &self.data.votes
    }

    pub fn votes_for_topic<'a>(&'a self, topic_id: &'a str) -> impl Iterator<Item = &'a Vote> {
        self.data.votes.iter().filter(move |v| v.topic_id == topic_id)
    }

    /// Insert, or overwrite the score of the existing (voter, topic) vote.
    /// Returns `true` on overwrite.
    pub fn upsert_vote(&mut self, vote: Vote) -> bool {
        match self
            .data
            .votes
            .iter_mut()
            .find(|v| v.voter_code == vote.voter_code && v.topic_id == vote.topic_id)
        {
            Some(existing) => {
                existing.score = vote.score;
                true
            }
            None => {
                self.data.votes.push(vote);
                false
            }
        }
    }

    pub fn delete_vote(&mut self, voter_code: &str, topic_id: &str) -> Option<Vote> {
        let idx = self
            .data
            .votes
            .iter()
            .position(|v| v.voter_code == voter_code && v.topic_id == topic_id)?;
        Some(self.data.votes.remove(idx))
    }

    // -- stars -------------------------------------------------------------

    pub fn stars(&self) -> &[Star] {
        &self.data.stars
    }

    pub fn stars_of<'a>(
        &'a self,
        voter_code: &'a str,
        class_id: &'a str,
    ) -> impl Iterator<Item = &'a Star> {
        self.data
            .stars
            .iter()
            .filter(move |s| s.voter_code == voter_code && s.class_id == class_id)
    }

    pub fn has_star(&self, voter_code: &str, topic_id: &str) -> bool {
        self.data
            .stars
            .iter()
            .any(|s| s.voter_code == voter_code && s.topic_id == topic_id)
    }

    pub fn star_count_for_topic(&self, topic_id: &str) -> usize {
        self.data
            .stars
            .iter()
            .filter(|s| s.topic_id == topic_id)
            .count()
    }

    pub fn insert_star(&mut self, star: Star) {
        self.data.stars.push(star);
    }

    pub fn delete_star(&mut self, voter_code: &str, topic_id: &str) -> Option<Star> {
        let idx = self
            .data
            .stars
            .iter()
            .position(|s| s.voter_code == voter_code && s.topic_id == topic_id)?;
        Some(self.data.stars.remove(idx))
    }

    pub fn clear_votes_and_stars(&mut self) {
        self.data.votes.clear();
        self.data.stars.clear();
    }
}
