//! Admin routes: content management, reports, exports and resets.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use votacao_core::error::VoteError;
use votacao_core::model::de::opt_string_or_number;
use votacao_report::{
    generate_json, generate_xlsx, JSON_EXPORT_FILENAME, XLSX_CONTENT_TYPE, XLSX_EXPORT_FILENAME,
};

use crate::error::{require, ApiError};
use crate::handlers::{ok_message, ok_with};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CodeQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClassQuery {
    #[serde(rename = "turmaId")]
    pub class_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceContentRequest {
    #[serde(
        rename = "apresentadorCode",
        default,
        deserialize_with = "opt_string_or_number"
    )]
    pub presenter_code: Option<String>,
    #[serde(rename = "perguntasText", default)]
    pub questions_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewTopicRequest {
    #[serde(rename = "perguntaId", default, deserialize_with = "opt_string_or_number")]
    pub question_id: Option<String>,
    #[serde(rename = "texto", default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EditTopicRequest {
    #[serde(rename = "texto", default)]
    pub text: Option<String>,
}

fn attachment(filename: &str) -> String {
    format!("attachment; filename=\"{filename}\"")
}

/// `GET /api/admin/apresentadores`
pub async fn list_presenters(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let engine = state.engine.lock().await;
    ok_with(engine.list_presenters())
}

/// `GET /api/admin/conteudo?code=`
pub async fn presenter_content(
    State(state): State<AppState>,
    Query(query): Query<CodeQuery>,
) -> Result<Json<Value>, ApiError> {
    let code = require(query.code, "code")?;
    let engine = state.engine.lock().await;
    ok_with(engine.presenter_content(&code)?)
}

/// `POST /api/admin/perguntas`
pub async fn replace_content(
    State(state): State<AppState>,
    Json(req): Json<ReplaceContentRequest>,
) -> Result<Json<Value>, ApiError> {
    let code = require(req.presenter_code, "apresentadorCode")?;
    let text = req.questions_text.unwrap_or_default();

    let mut engine = state.engine.lock().await;
    let questions = engine.replace_content(&code, &text).await?;
    Ok(Json(json!({
        "ok": true,
        "message": "questions and placeholder topics replaced",
        "perguntas": questions,
    })))
}

/// `POST /api/admin/topicos`
pub async fn add_topic(
    State(state): State<AppState>,
    Json(req): Json<NewTopicRequest>,
) -> Result<Json<Value>, ApiError> {
    let question_id = require(req.question_id, "perguntaId")?;
    let text = require(req.text, "texto")?;

    let mut engine = state.engine.lock().await;
    let topic = engine.add_topic(&question_id, &text).await?;
    Ok(Json(json!({ "ok": true, "message": "topic created", "topico": topic })))
}

/// `PUT /api/admin/topicos/:id`
pub async fn edit_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EditTopicRequest>,
) -> Result<Json<Value>, ApiError> {
    let text = require(req.text, "texto")?;

    let mut engine = state.engine.lock().await;
    let topic = engine.edit_topic(&id, &text).await?;
    Ok(Json(json!({ "ok": true, "message": "topic updated", "topico": topic })))
}

/// `DELETE /api/admin/topicos/:id`
pub async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut engine = state.engine.lock().await;
    engine.delete_topic(&id).await?;
    Ok(ok_message("topic deleted"))
}

/// `GET /api/admin/relatorio?turmaId=`
pub async fn class_report(
    State(state): State<AppState>,
    Query(query): Query<ClassQuery>,
) -> Result<Json<Value>, ApiError> {
    let class_id = require(query.class_id, "turmaId")?;
    let engine = state.engine.lock().await;
    ok_with(engine.class_report(&class_id)?)
}

/// `GET /api/admin/export-json`
pub async fn export_json(State(state): State<AppState>) -> Result<Response, ApiError> {
    let engine = state.engine.lock().await;
    let body = generate_json(engine.repository())
        .map_err(|e| VoteError::internal("failed to export JSON", e))?;

    Ok((
        [(header::CONTENT_DISPOSITION, attachment(JSON_EXPORT_FILENAME))],
        Json(body),
    )
        .into_response())
}

/// `GET /api/admin/export-excel-completo`
pub async fn export_xlsx(State(state): State<AppState>) -> Result<Response, ApiError> {
    let engine = state.engine.lock().await;
    let bytes = generate_xlsx(engine.repository())
        .map_err(|e| VoteError::internal("failed to export spreadsheet", e))?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, attachment(XLSX_EXPORT_FILENAME)),
        ],
        bytes,
    )
        .into_response())
}

/// `POST /api/admin/reset-votos`
pub async fn reset_votes(State(state): State<AppState>) -> Json<Value> {
    let mut engine = state.engine.lock().await;
    engine.reset_votes().await;
    ok_message("all votes and stars were cleared")
}

/// `POST /api/admin/reseed`
pub async fn reseed(State(state): State<AppState>) -> Json<Value> {
    let mut engine = state.engine.lock().await;
    let seed = engine.seed().clone();
    engine.reseed(seed).await;
    ok_message("state rebuilt from seed")
}
