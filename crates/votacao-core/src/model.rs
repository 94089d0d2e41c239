//! Core data model types for votacao.
//!
//! Field names on the wire follow the original JSON document (`turmaId`,
//! `apresentadorCode`, `topicoId`, `nota`, ...) so that persisted state and
//! existing frontends stay compatible.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a user in the voting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Participant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Participant => write!(f, "participant"),
        }
    }
}

/// A person who can log in: admin, voter, presenter, or voter and presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique login code.
    pub code: String,
    /// Display name. Also the input for identity matching.
    pub name: String,
    pub role: Role,
    /// Class the user presents in, if any.
    #[serde(rename = "turmaId", default)]
    pub class_id: Option<String>,
    #[serde(default)]
    pub is_presenter: bool,
    /// Presenter codes this user may not score, derived from identity matching.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_presenters: Vec<String>,
}

impl User {
    pub fn participant(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            role: Role::Participant,
            class_id: None,
            is_presenter: false,
            blocked_presenters: Vec::new(),
        }
    }

    pub fn presenter(
        code: impl Into<String>,
        name: impl Into<String>,
        class_id: impl Into<String>,
    ) -> Self {
        Self {
            class_id: Some(class_id.into()),
            is_presenter: true,
            ..Self::participant(code, name)
        }
    }

    pub fn admin(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Role::Admin,
            ..Self::participant(code, name)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A class ("turma"): a fixed partition of presenters and their topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: String,
    pub name: String,
}

impl Class {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A question ("pergunta") owned by one presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(rename = "turmaId")]
    pub class_id: String,
    #[serde(rename = "apresentadorCode")]
    pub presenter_code: String,
    #[serde(rename = "texto")]
    pub text: String,
    /// 1-based position among the presenter's questions.
    #[serde(rename = "ordem")]
    pub order: u32,
}

/// A topic ("tópico"): the unit that gets scored and starred.
///
/// Class and presenter are copied from the parent question at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    #[serde(rename = "perguntaId")]
    pub question_id: String,
    #[serde(rename = "turmaId")]
    pub class_id: String,
    #[serde(rename = "apresentadorCode")]
    pub presenter_code: String,
    #[serde(rename = "texto")]
    pub text: String,
}

/// A score given by one voter to one topic. At most one per pair.
///
/// New votes are always whole numbers, but older documents may hold decimal
/// scores, so the stored value is an `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "userCode")]
    pub voter_code: String,
    #[serde(rename = "topicoId")]
    pub topic_id: String,
    #[serde(rename = "nota", serialize_with = "score::serialize")]
    pub score: f64,
}

/// A star grant. Unique per (voter, topic), capped per (voter, class).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Star {
    #[serde(rename = "userCode")]
    pub voter_code: String,
    #[serde(rename = "turmaId")]
    pub class_id: String,
    #[serde(rename = "topicoId")]
    pub topic_id: String,
}

/// Every entity collection, exactly as persisted under `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(rename = "turmas", default)]
    pub classes: Vec<Class>,
    #[serde(rename = "perguntas", default)]
    pub questions: Vec<Question>,
    #[serde(rename = "topicos", default)]
    pub topics: Vec<Topic>,
    #[serde(rename = "votos", default)]
    pub votes: Vec<Vote>,
    #[serde(rename = "estrelas", default)]
    pub stars: Vec<Star>,
}

/// The persisted document: collections plus the next-id counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub data: Collections,
    #[serde(rename = "nextPerguntaId", default = "first_id")]
    pub next_question_id: u64,
    #[serde(rename = "nextTopicoId", default = "first_id")]
    pub next_topic_id: u64,
}

fn first_id() -> u64 {
    1
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            data: Collections::default(),
            next_question_id: first_id(),
            next_topic_id: first_id(),
        }
    }
}

/// Serialization of stored scores: whole values are written as JSON integers.
pub mod score {
    use serde::Serializer;

    /// `value` as an integer when it has no fractional part.
    pub fn whole(value: f64) -> Option<i64> {
        (value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15).then(|| value as i64)
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        match whole(*value) {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_f64(*value),
        }
    }
}

/// Serde helpers for request payloads.
///
/// Browsers send codes and ids either as strings or as numbers; both are
/// accepted and normalized to `String`.
pub mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn value_to_string(value: Value) -> Option<String> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) if n.is_f64() => Some(
                n.as_f64()
                    .and_then(super::score::whole)
                    .map_or_else(|| n.to_string(), |whole| whole.to_string()),
            ),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Deserialize an optional string-or-number into `Option<String>`.
    ///
    /// Empty strings, `null`, booleans and objects all map to `None`, so the
    /// caller can report a missing field uniformly.
    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(value_to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::Participant.to_string(), "participant");
    }

    #[test]
    fn user_uses_original_field_names() {
        let user = User::presenter("1000", "Thaynara", "M");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["turmaId"], "M");
        assert_eq!(json["isPresenter"], true);
        assert_eq!(json["role"], "participant");
        assert!(json.get("blockedPresenters").is_none());
    }

    #[test]
    fn snapshot_loads_original_document() {
        let raw = r#"{
            "data": {
                "users": [{"code": "100", "name": "Elias", "role": "admin", "turmaId": null, "isPresenter": false}],
                "turmas": [{"id": "M", "name": "Manhã"}],
                "perguntas": [{"id": "1", "turmaId": "M", "apresentadorCode": "1000", "texto": "Q", "ordem": 1}],
                "topicos": [{"id": "1", "perguntaId": "1", "turmaId": "M", "apresentadorCode": "1000", "texto": "T"}],
                "votos": [{"userCode": "1", "topicoId": "1", "nota": 9}],
                "estrelas": [{"userCode": "1", "turmaId": "M", "topicoId": "1"}]
            },
            "nextPerguntaId": 2,
            "nextTopicoId": 2
        }"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.data.users[0].role, Role::Admin);
        assert_eq!(snapshot.data.topics[0].presenter_code, "1000");
        assert_eq!(snapshot.data.votes[0].score, 9.0);
        assert_eq!(snapshot.next_topic_id, 2);
    }

    #[test]
    fn snapshot_counters_default_to_one() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"data": {}}"#).unwrap();
        assert_eq!(snapshot.next_question_id, 1);
        assert_eq!(snapshot.next_topic_id, 1);
        assert!(snapshot.data.users.is_empty());
    }

    #[derive(Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "de::opt_string_or_number")]
        id: Option<String>,
    }

    #[test]
    fn string_or_number_ids() {
        let p: Payload = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("42"));
        let p: Payload = serde_json::from_str(r#"{"id": " 7 "}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("7"));
        let p: Payload = serde_json::from_str(r#"{"id": ""}"#).unwrap();
        assert!(p.id.is_none());
        let p: Payload = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.id.is_none());
        let p: Payload = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert!(p.id.is_none());
    }

    #[test]
    fn whole_float_ids_drop_the_fraction() {
        let p: Payload = serde_json::from_str(r#"{"id": 42.0}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("42"));
        let p: Payload = serde_json::from_str(r#"{"id": 4.5}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("4.5"));
    }

    #[test]
    fn decimal_scores_survive_a_round_trip() {
        let raw = r#"{"data": {"votos": [
            {"userCode": "1", "topicoId": "1", "nota": 4.5},
            {"userCode": "2", "topicoId": "1", "nota": 5}
        ]}}"#;
        let snapshot: Snapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.data.votes[0].score, 4.5);
        assert_eq!(snapshot.data.votes[1].score, 5.0);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["data"]["votos"][0]["nota"], 4.5);
        assert!(json["data"]["votos"][1]["nota"].is_i64());
        assert_eq!(json["data"]["votos"][1]["nota"], 5);
    }
}
