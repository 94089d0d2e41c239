//! Read models returned by the engine's query operations.
//!
//! Shapes and key names match what the browser pages consume.

use serde::Serialize;

use crate::model::{Class, Question, Role, Topic, User};

/// What a successful login returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub code: String,
    pub name: String,
    pub role: Role,
    #[serde(rename = "turmaId")]
    pub class_id: Option<String>,
    pub is_presenter: bool,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            code: user.code.clone(),
            name: user.name.clone(),
            role: user.role,
            class_id: user.class_id.clone(),
            is_presenter: user.is_presenter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenterSummary {
    pub code: String,
    pub name: String,
    #[serde(rename = "turmaId")]
    pub class_id: Option<String>,
}

impl From<&User> for PresenterSummary {
    fn from(user: &User) -> Self {
        Self {
            code: user.code.clone(),
            name: user.name.clone(),
            class_id: user.class_id.clone(),
        }
    }
}

/// Admin listing entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenterEntry {
    pub code: String,
    pub name: String,
    #[serde(rename = "turmaId")]
    pub class_id: Option<String>,
    pub is_presenter: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenterListing {
    #[serde(rename = "apresentadores")]
    pub presenters: Vec<PresenterEntry>,
    #[serde(rename = "turmas")]
    pub classes: Vec<Class>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassWithPresenters {
    #[serde(flatten)]
    pub class: Class,
    #[serde(rename = "apresentadores")]
    pub presenters: Vec<PresenterSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionWithTopics {
    #[serde(flatten)]
    pub question: Question,
    #[serde(rename = "topicos")]
    pub topics: Vec<Topic>,
}

/// A presenter with their questions and topics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenterContent {
    #[serde(rename = "apresentador")]
    pub presenter: PresenterSummary,
    #[serde(rename = "perguntas")]
    pub questions: Vec<QuestionWithTopics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarUsage {
    #[serde(rename = "usadas")]
    pub used: usize,
    #[serde(rename = "maximo")]
    pub quota: usize,
}

impl StarUsage {
    pub fn exhausted(&self) -> bool {
        self.used >= self.quota
    }
}

/// One topic as seen by a voter deciding where to put stars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarBoardTopic {
    pub id: String,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "apresentadorNome")]
    pub presenter_name: String,
    #[serde(rename = "jaVotou")]
    pub already_starred: bool,
    #[serde(rename = "proprioTopico")]
    pub own_topic: bool,
    #[serde(rename = "podeVotar")]
    pub can_star: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StarBoard {
    #[serde(rename = "turma")]
    pub class: Class,
    #[serde(rename = "estrelas")]
    pub usage: StarUsage,
    #[serde(rename = "topicos")]
    pub topics: Vec<StarBoardTopic>,
}
