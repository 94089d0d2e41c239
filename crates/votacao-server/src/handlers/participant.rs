//! Login and voter-facing routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use votacao_core::error::VoteError;
use votacao_core::model::de::opt_string_or_number;

use crate::error::{require, ApiError};
use crate::handlers::{ok_message, ok_with};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    #[serde(rename = "userCode", default, deserialize_with = "opt_string_or_number")]
    pub user_code: Option<String>,
    #[serde(rename = "topicoId", default, deserialize_with = "opt_string_or_number")]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub nota: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct StarRequest {
    #[serde(rename = "userCode", default, deserialize_with = "opt_string_or_number")]
    pub user_code: Option<String>,
    #[serde(rename = "turmaId", default, deserialize_with = "opt_string_or_number")]
    pub class_id: Option<String>,
    #[serde(rename = "topicoId", default, deserialize_with = "opt_string_or_number")]
    pub topic_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserCodeQuery {
    #[serde(rename = "userCode")]
    pub user_code: Option<String>,
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let code = require(req.code, "code")?;
    let engine = state.engine.lock().await;
    let user = engine.login(&code)?;
    Ok(Json(json!({ "ok": true, "user": user })))
}

/// `GET /api/turmas-com-apresentadores`
pub async fn classes_with_presenters(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.lock().await;
    Ok(Json(json!({ "ok": true, "turmas": engine.classes_with_presenters() })))
}

/// `GET /api/apresentador/:code/perguntas`
pub async fn presenter_questions(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.lock().await;
    ok_with(engine.presenter_content(&code)?)
}

/// `POST /api/votos`
pub async fn cast_vote(
    State(state): State<AppState>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_code = require(req.user_code, "userCode")?;
    let topic_id = require(req.topic_id, "topicoId")?;
    let score = req
        .nota
        .filter(|v| !v.is_null())
        .ok_or_else(|| VoteError::missing("nota"))?;

    let mut engine = state.engine.lock().await;
    let overwritten = engine.cast_vote(&user_code, &topic_id, &score).await?;
    Ok(ok_message(if overwritten {
        "vote updated"
    } else {
        "vote recorded"
    }))
}

/// `GET /api/turma/:turmaId/topicos-estrelas?userCode=`
pub async fn star_board(
    State(state): State<AppState>,
    Path(class_id): Path<String>,
    Query(query): Query<UserCodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let user_code = require(query.user_code, "userCode")?;
    let engine = state.engine.lock().await;
    ok_with(engine.star_board(&class_id, &user_code)?)
}

/// `POST /api/estrelas`
pub async fn grant_star(
    State(state): State<AppState>,
    Json(req): Json<StarRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_code = require(req.user_code, "userCode")?;
    let class_id = require(req.class_id, "turmaId")?;
    let topic_id = require(req.topic_id, "topicoId")?;

    let mut engine = state.engine.lock().await;
    engine.grant_star(&user_code, &class_id, &topic_id).await?;
    Ok(ok_message("star recorded"))
}
