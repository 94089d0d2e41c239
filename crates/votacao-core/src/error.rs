//! Domain error types.
//!
//! Every rejected request maps to exactly one of these variants. The HTTP
//! layer turns them into status codes; the messages are user-facing.

use std::fmt;

use thiserror::Error;

/// Kinds of entity that a lookup can fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Presenter,
    Class,
    Question,
    Topic,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Presenter => write!(f, "presenter"),
            Entity::Class => write!(f, "class"),
            Entity::Question => write!(f, "question"),
            Entity::Topic => write!(f, "topic"),
        }
    }
}

/// Why a vote or star was refused even though every id resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forbidden {
    /// Voter and topic owner are the same person.
    OwnTopic,
    /// Voter already used every star in the class.
    QuotaExhausted { quota: usize },
    /// Voter already starred this topic.
    DuplicateStar,
}

impl fmt::Display for Forbidden {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forbidden::OwnTopic => write!(f, "you cannot score your own topics"),
            Forbidden::QuotaExhausted { quota } => {
                write!(f, "you already used all {quota} stars in this class")
            }
            Forbidden::DuplicateStar => write!(f, "you already starred this topic"),
        }
    }
}

/// Errors returned by the voting engine.
#[derive(Debug, Error)]
pub enum VoteError {
    /// A required request field was absent or blank.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// An id or code did not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// A score fell outside the voter's allowed range.
    #[error("score must be between 1 and {max}")]
    InvalidRange { max: u8 },

    /// The request resolved but a voting rule refused it.
    #[error("{0}")]
    Forbidden(Forbidden),

    /// Unexpected failure during aggregation or export.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VoteError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        VoteError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        VoteError::MissingField(field.into())
    }

    /// Wrap an unexpected failure with what was being attempted.
    pub fn internal(context: &str, err: impl fmt::Display) -> Self {
        VoteError::Internal(format!("{context}: {err:#}"))
    }
}

pub type VoteResult<T> = Result<T, VoteError>;
