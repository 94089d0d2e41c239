//! Route handlers.

pub mod admin;
pub mod health;
pub mod participant;

use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// `{"ok": true}` merged with the fields of `body`.
pub(crate) fn ok_with<T: Serialize>(body: T) -> Result<Json<Value>, ApiError> {
    let mut map = match serde_json::to_value(body).map_err(anyhow::Error::from)? {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            map
        }
    };
    map.insert("ok".into(), Value::Bool(true));
    Ok(Json(Value::Object(map)))
}

/// `{"ok": true, "message": ...}`.
pub(crate) fn ok_message(message: &str) -> Json<Value> {
    Json(serde_json::json!({ "ok": true, "message": message }))
}
