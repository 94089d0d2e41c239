//! votacao-core: Data model, rule engine, identity matching and rankings.
//!
//! This crate holds everything that decides whether a vote or a star is
//! accepted. Storage backends, exports and the HTTP surface live in sibling
//! crates and only talk to [`engine::VotingEngine`].

pub mod engine;
pub mod error;
pub mod identity;
pub mod model;
pub mod parser;
pub mod report;
pub mod repository;
pub mod statistics;
pub mod traits;
pub mod views;

pub use engine::{RuleConfig, VotingEngine};
pub use error::{VoteError, VoteResult};
