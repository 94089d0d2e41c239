//! TOML seed parser.
//!
//! A seed describes the fixed part of a session: classes, admins, voters,
//! and every presenter's questions and topics. Votes and stars never come
//! from a seed.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::identity::{normalize_name, IdentityMatcher};
use crate::model::{Class, User};
use crate::repository::Repository;

/// The seed embedded in the binary, used when no seed file is configured.
pub const DEFAULT_SEED: &str = include_str!("../seed/default.toml");

/// A parsed seed, ready to build a [`Repository`].
#[derive(Debug, Clone)]
pub struct Seed {
    pub classes: Vec<Class>,
    pub admins: Vec<SeedUser>,
    pub voters: Vec<SeedUser>,
    pub presenters: Vec<SeedPresenter>,
}

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct SeedPresenter {
    pub code: String,
    pub name: String,
    pub class_id: String,
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Clone)]
pub struct SeedQuestion {
    pub text: String,
    pub topics: Vec<String>,
}

/// Intermediate TOML structure for parsing seed files.
#[derive(Debug, Deserialize)]
struct TomlSeedFile {
    #[serde(default)]
    seed: TomlSeedHeader,
    #[serde(default)]
    classes: Vec<TomlClass>,
    #[serde(default)]
    admins: Vec<TomlUser>,
    #[serde(default)]
    voters: Vec<TomlUser>,
    #[serde(default)]
    presenters: Vec<TomlPresenter>,
}

#[derive(Debug, Deserialize)]
struct TomlSeedHeader {
    #[serde(default = "default_presenter_code_start")]
    presenter_code_start: u32,
}

impl Default for TomlSeedHeader {
    fn default() -> Self {
        Self {
            presenter_code_start: default_presenter_code_start(),
        }
    }
}

fn default_presenter_code_start() -> u32 {
    1000
}

#[derive(Debug, Deserialize)]
struct TomlClass {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlUser {
    code: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TomlPresenter {
    name: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    period: Option<u32>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    text: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Parse a seed file from disk.
pub fn parse_seed(path: &Path) -> Result<Seed> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file: {}", path.display()))?;

    parse_seed_str(&content, path)
}

/// Parse the embedded [`DEFAULT_SEED`].
pub fn default_seed() -> Result<Seed> {
    parse_seed_str(DEFAULT_SEED, Path::new("<embedded seed>"))
}

/// Parse a TOML string into a [`Seed`] (useful for testing).
pub fn parse_seed_str(content: &str, source_path: &Path) -> Result<Seed> {
    let parsed: TomlSeedFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    anyhow::ensure!(
        !parsed.classes.is_empty(),
        "seed {} defines no classes",
        source_path.display()
    );

    let classes: Vec<Class> = parsed
        .classes
        .into_iter()
        .map(|c| Class::new(c.id.trim(), c.name.trim()))
        .collect();

    let mut next_code = parsed.seed.presenter_code_start;
    let presenters = parsed
        .presenters
        .into_iter()
        .map(|p| {
            let generated = next_code.to_string();
            next_code += 1;

            let class_id = match (p.class, p.period) {
                (Some(class), _) => class.trim().to_string(),
                (None, period) => class_for_period(&classes, period.unwrap_or(1)),
            };

            SeedPresenter {
                code: p.code.unwrap_or(generated),
                name: p.name.trim().to_string(),
                class_id,
                questions: p
                    .questions
                    .into_iter()
                    .map(|q| SeedQuestion {
                        text: q.text.trim().to_string(),
                        topics: q.topics,
                    })
                    .collect(),
            }
        })
        .collect();

    let to_users = |users: Vec<TomlUser>| -> Vec<SeedUser> {
        users
            .into_iter()
            .map(|u| SeedUser {
                code: u.code.trim().to_string(),
                name: u.name.trim().to_string(),
            })
            .collect()
    };

    Ok(Seed {
        classes,
        admins: to_users(parsed.admins),
        voters: to_users(parsed.voters),
        presenters,
    })
}

/// Periods 1 and 2 run in the first class, every later period in the second.
fn class_for_period(classes: &[Class], period: u32) -> String {
    let idx = if period <= 2 { 0 } else { 1 };
    classes
        .get(idx)
        .or_else(|| classes.last())
        .map(|c| c.id.clone())
        .unwrap_or_default()
}

impl Seed {
    /// Build a fresh repository: classes, then admins, presenters with their
    /// questions and topics, then voters. Blank topics are skipped.
    pub fn build(&self) -> Repository {
        let mut repo = Repository::new();

        for class in &self.classes {
            repo.upsert_class(class.clone());
        }
        for admin in &self.admins {
            repo.upsert_user(User::admin(&admin.code, &admin.name));
        }

        for presenter in &self.presenters {
            repo.upsert_user(User::presenter(
                &presenter.code,
                &presenter.name,
                &presenter.class_id,
            ));

            for (idx, q) in presenter.questions.iter().enumerate() {
                let question =
                    repo.insert_question(&presenter.class_id, &presenter.code, &q.text, idx as u32 + 1);
                for text in q.topics.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                    repo.insert_topic(&question, text);
                }
            }
        }

        for voter in &self.voters {
            if repo.user(&voter.code).is_some() {
                tracing::warn!("voter code {} already taken, skipping {}", voter.code, voter.name);
                continue;
            }
            repo.upsert_user(User::participant(&voter.code, &voter.name));
        }

        repo
    }
}

/// A warning from seed validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The user code or name the warning is about (if applicable).
    pub subject: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn about(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
            message: message.into(),
        }
    }
}

/// Validate a seed for common issues.
///
/// `max_questions` is the per-presenter question limit; `matcher` is the
/// identity strategy the server will run with, used to flag voters that
/// would be blocked from more than one presenter.
pub fn validate_seed(
    seed: &Seed,
    max_questions: usize,
    matcher: &dyn IdentityMatcher,
) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Duplicate codes across every user kind
    let mut seen_codes = HashSet::new();
    let all_codes = seed
        .admins
        .iter()
        .map(|u| &u.code)
        .chain(seed.presenters.iter().map(|p| &p.code))
        .chain(seed.voters.iter().map(|u| &u.code));
    for code in all_codes {
        if !seen_codes.insert(code) {
            warnings.push(ValidationWarning::about(
                code.clone(),
                format!("duplicate user code: {code}"),
            ));
        }
    }

    // Duplicate class ids
    let mut seen_classes = HashSet::new();
    for class in &seed.classes {
        if !seen_classes.insert(&class.id) {
            warnings.push(ValidationWarning::about(
                class.id.clone(),
                format!("duplicate class id: {}", class.id),
            ));
        }
    }

    for p in &seed.presenters {
        if !seen_classes.contains(&p.class_id) {
            warnings.push(ValidationWarning::about(
                p.name.clone(),
                format!("presenter assigned to unknown class '{}'", p.class_id),
            ));
        }

        if p.questions.len() > max_questions {
            warnings.push(ValidationWarning::about(
                p.name.clone(),
                format!(
                    "{} questions, more than the limit of {max_questions}",
                    p.questions.len()
                ),
            ));
        }

        for q in &p.questions {
            if q.text.is_empty() {
                warnings.push(ValidationWarning::about(p.name.clone(), "question text is empty"));
            }
            if q.topics.iter().any(|t| t.trim().is_empty()) {
                warnings.push(ValidationWarning::about(
                    p.name.clone(),
                    format!("blank topic under '{}' will be skipped", q.text),
                ));
            }
            if q.topics.is_empty() {
                warnings.push(ValidationWarning::about(
                    p.name.clone(),
                    format!("question '{}' has no topics", q.text),
                ));
            }
        }
    }

    // Ambiguous identities: a voter whose name pairs with several presenters
    let presenters: Vec<User> = seed
        .presenters
        .iter()
        .map(|p| User::presenter(&p.code, &p.name, &p.class_id))
        .collect();
    let mut matches_by_voter: HashMap<&str, Vec<&str>> = HashMap::new();
    for voter in &seed.voters {
        let as_user = User::participant(&voter.code, &voter.name);
        for p in &presenters {
            if matcher.matches(&as_user, p) {
                matches_by_voter
                    .entry(voter.code.as_str())
                    .or_default()
                    .push(p.name.as_str());
            }
        }
    }
    for voter in &seed.voters {
        if let Some(names) = matches_by_voter.get(voter.code.as_str()) {
            if names.len() > 1 {
                warnings.push(ValidationWarning::about(
                    voter.code.clone(),
                    format!(
                        "voter '{}' matches {} presenters ({}) under '{}' identity matching",
                        voter.name,
                        names.len(),
                        names.join(", "),
                        matcher.name()
                    ),
                ));
            }
        }
    }

    // Presenters nobody can be matched to are fine, but presenters sharing a
    // normalized name are indistinguishable
    let mut seen_names: HashMap<String, &str> = HashMap::new();
    for p in &seed.presenters {
        if let Some(first) = seen_names.insert(normalize_name(&p.name), p.code.as_str()) {
            warnings.push(ValidationWarning::about(
                p.code.clone(),
                format!("presenter '{}' has the same name as presenter {first}", p.name),
            ));
        }
    }

    warnings
}
