//! HTTP commands for answer tracking

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::answers::{self, Answer, AnswerId, LookupStatus};
use crate::enrichment::Revealed;
use crate::AppState;

use super::{CommandError, CommandResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// `YYYY-MM-DD`; all answers when absent
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MissedAnswerRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub id: AnswerId,
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: AnswerId,
    #[serde(flatten)]
    pub status: LookupStatus,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub id: AnswerId,
    pub info: String,
}

// ==================== Ledger Commands ====================

/// List answers, optionally only those logged on one day
pub async fn list_answers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Answer>> {
    let answers: Vec<Answer> = state
        .ledger()
        .filter_by_date(query.date)
        .into_iter()
        .cloned()
        .collect();
    Json(answers)
}

/// Record a correct answer
pub async fn add_correct_answer(State(state): State<AppState>) -> (StatusCode, Json<Answer>) {
    let answer = state.ledger().add_correct().clone();
    (StatusCode::CREATED, Json(answer))
}

/// Record a missed answer
pub async fn add_missed_answer(
    State(state): State<AppState>,
    Json(request): Json<MissedAnswerRequest>,
) -> CommandResult<(StatusCode, Json<Answer>)> {
    let answer = state.ledger().add_missed(&request.text)?.clone();
    Ok((StatusCode::CREATED, Json(answer)))
}

/// Get a single answer
pub async fn get_answer(
    State(state): State<AppState>,
    Path(id): Path<AnswerId>,
) -> CommandResult<Json<Answer>> {
    let answer = state.ledger().get(id)?.clone();
    Ok(Json(answer))
}

/// Show or hide an answer's study material
pub async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<AnswerId>,
) -> CommandResult<Json<VisibilityResponse>> {
    let visible = state.ledger().toggle_visibility(id)?;
    Ok(Json(VisibilityResponse { id, visible }))
}

// ==================== Study Material Commands ====================

/// Reveal study material, fetching it on first use
pub async fn reveal_study_material(
    State(state): State<AppState>,
    Path(id): Path<AnswerId>,
) -> CommandResult<Json<Revealed>> {
    let revealed = state.enrichment.reveal(id).await?;
    Ok(Json(revealed))
}

/// Lookup status for one answer
pub async fn lookup_status(
    State(state): State<AppState>,
    Path(id): Path<AnswerId>,
) -> CommandResult<Json<StatusResponse>> {
    let status = state.enrichment.status(id)?;
    Ok(Json(StatusResponse { id, status }))
}

/// Static additional info for a missed answer
pub async fn additional_info(
    State(state): State<AppState>,
    Path(id): Path<AnswerId>,
) -> CommandResult<Json<InfoResponse>> {
    let ledger = state.ledger();
    let answer = ledger.get(id)?;
    if !answer.is_enrichable() {
        return Err(CommandError::new(
            StatusCode::CONFLICT,
            format!("Answer {} is a correct answer and has no additional info", id),
        ));
    }
    Ok(Json(InfoResponse {
        id,
        info: answers::additional_info(&answer.text),
    }))
}
