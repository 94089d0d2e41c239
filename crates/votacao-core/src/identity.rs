//! Name normalization and "is this the same person" matching.
//!
//! Voters and presenters are separate accounts with separate codes, so the
//! only link between them is the display name. Matching is a heuristic: the
//! overlap strategy pairs "Humberto e Danyllo" with both Humberto and
//! Danyllo, but it also pairs "Thiago" with "Thiago Meller". Seed validation
//! reports such collisions instead of hiding them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::User;

/// Strip diacritics, lowercase and trim.
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// [`normalize_name`] followed by dropping everything that is not
/// alphanumeric, spaces and punctuation included.
pub fn normalize_strict(name: &str) -> String {
    normalize_name(name)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Strategy deciding whether a voter and a presenter are the same person.
pub trait IdentityMatcher: Send + Sync {
    /// Short strategy name, as written in configuration.
    fn name(&self) -> &str;

    /// Whether `voter` should be treated as `presenter`.
    fn matches(&self, voter: &User, presenter: &User) -> bool;
}

/// Normalized names must be equal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactNameMatcher;

impl IdentityMatcher for ExactNameMatcher {
    fn name(&self) -> &str {
        "exact"
    }

    fn matches(&self, voter: &User, presenter: &User) -> bool {
        let a = normalize_name(&voter.name);
        !a.is_empty() && a == normalize_name(&presenter.name)
    }
}

/// One strict-normalized name must contain the other.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameOverlapMatcher;

impl IdentityMatcher for NameOverlapMatcher {
    fn name(&self) -> &str {
        "overlap"
    }

    fn matches(&self, voter: &User, presenter: &User) -> bool {
        let a = normalize_strict(&voter.name);
        let b = normalize_strict(&presenter.name);
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a.contains(&b) || b.contains(&a)
    }
}

/// Configurable choice of [`IdentityMatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityStrategy {
    Exact,
    #[default]
    Overlap,
}

impl IdentityStrategy {
    pub fn matcher(self) -> Box<dyn IdentityMatcher> {
        match self {
            IdentityStrategy::Exact => Box::new(ExactNameMatcher),
            IdentityStrategy::Overlap => Box::new(NameOverlapMatcher),
        }
    }
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityStrategy::Exact => write!(f, "exact"),
            IdentityStrategy::Overlap => write!(f, "overlap"),
        }
    }
}

impl FromStr for IdentityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exact" => Ok(IdentityStrategy::Exact),
            "overlap" | "substring" => Ok(IdentityStrategy::Overlap),
            other => Err(format!("unknown identity strategy: {other}")),
        }
    }
}

/// Resolves self-reference between a voter and a topic owner.
pub struct IdentityResolver {
    matcher: Box<dyn IdentityMatcher>,
}

impl IdentityResolver {
    pub fn new(matcher: Box<dyn IdentityMatcher>) -> Self {
        Self { matcher }
    }

    pub fn matcher_name(&self) -> &str {
        self.matcher.name()
    }

    /// Whether `voter` owns a topic presented by `presenter_code`.
    ///
    /// True on equal codes, on a precomputed block-list hit, or when the
    /// matcher pairs the two users. `presenter` is `None` when the owner code
    /// no longer resolves; only the code checks apply then.
    pub fn is_self(&self, voter: &User, presenter_code: &str, presenter: Option<&User>) -> bool {
        if voter.code == presenter_code {
            return true;
        }
        if voter.blocked_presenters.iter().any(|c| c == presenter_code) {
            return true;
        }
        presenter.is_some_and(|p| self.matcher.matches(voter, p))
    }

    /// Recompute every user's `blocked_presenters` list.
    pub fn derive_block_lists(&self, users: &mut [User]) {
        let presenters: Vec<User> = users.iter().filter(|u| u.is_presenter).cloned().collect();

        for user in users.iter_mut() {
            user.blocked_presenters = presenters
                .iter()
                .filter(|p| p.code != user.code && self.matcher.matches(user, p))
                .map(|p| p.code.clone())
                .collect();
        }
    }
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new(IdentityStrategy::default().matcher())
    }
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("matcher", &self.matcher.name())
            .finish()
    }
}
