//! Route handlers. Every mutation resolves the room actor, sends one
//! command, and returns either the full post-state snapshot or `{error}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{RoomError, RoomResult};
use crate::model::{AnswersPatch, GameConfigInput, Marks, ParticipantStatus};
use crate::room::actor::RoomHandle;
use crate::snapshot::{ParticipantView, RoomSnapshot};
use crate::util::id;

use super::{ApiJson, AppState};

pub async fn healthz() -> &'static str {
    "ok"
}

/// Resolve a client-supplied room code to a live actor handle.
fn room(state: &AppState, code: &str) -> RoomResult<RoomHandle> {
    let code =
        id::normalize_room_code(code).ok_or_else(|| RoomError::bad_request("invalid room code"))?;
    state
        .rooms
        .get(&code)
        .ok_or_else(|| RoomError::not_found("room not found"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub host_name: String,
    pub max_participants: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_code: String,
    pub host_name: String,
    pub max_participants: u8,
    pub ws_path: String,
    pub host_token: String,
}

pub async fn create_room(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateRoomRequest>,
) -> RoomResult<(StatusCode, Json<CreateRoomResponse>)> {
    let created = state
        .rooms
        .create_room(&req.host_name, req.max_participants)
        .await?;
    let response = CreateRoomResponse {
        ws_path: format!("/ws/{}", created.room_code),
        room_code: created.room_code,
        host_name: created.host_name,
        max_participants: created.max_participants,
        host_token: created.host_token,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?.snapshot().await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub request_id: String,
    pub participant: ParticipantView,
    pub status: ParticipantStatus,
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<JoinRequest>,
) -> RoomResult<(StatusCode, Json<JoinResponse>)> {
    let accepted = room(&state, &code)?.submit_join(req.name).await?;
    let response = JoinResponse {
        request_id: accepted.request_id,
        status: accepted.participant.status,
        participant: accepted.participant,
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub host_token: String,
    pub request_id: String,
    pub approve: bool,
}

pub async fn review_admission(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<AdmissionRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .review_join(req.host_token, req.request_id, req.approve)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub host_token: String,
    #[serde(default)]
    pub config: Option<GameConfigInput>,
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<StartRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .start_game(req.host_token, req.config)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    pub participant_id: String,
    pub number: u8,
}

pub async fn call_number(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<CallRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .call_number(req.participant_id, req.number)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersRequest {
    pub participant_id: String,
    #[serde(default)]
    pub answers: AnswersPatch,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

pub async fn update_draft(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<AnswersRequest>,
) -> RoomResult<Json<Ack>> {
    room(&state, &code)?
        .update_draft(req.participant_id, req.answers)
        .await?;
    Ok(Json(Ack { ok: true }))
}

pub async fn submit_answers(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<AnswersRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .submit_answers(req.participant_id, req.answers)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndRequest {
    pub participant_id: String,
}

pub async fn end_round(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<EndRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .end_round_early(req.participant_id)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub host_token: String,
    pub round_number: u32,
    pub participant_id: String,
    pub marks: Marks,
}

pub async fn score_submission(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<ScoreRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .score_submission(req.host_token, req.round_number, req.participant_id, req.marks)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRequest {
    pub host_token: String,
    pub round_number: u32,
}

pub async fn publish_round(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<RoundRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .publish_round(req.host_token, req.round_number)
        .await?;
    Ok(Json(snapshot))
}

pub async fn discard_round(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<RoundRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?
        .discard_round(req.host_token, req.round_number)
        .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostRequest {
    pub host_token: String,
}

pub async fn cancel_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<HostRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?.cancel_game(req.host_token).await?;
    Ok(Json(snapshot))
}

pub async fn finish_game(
    State(state): State<AppState>,
    Path(code): Path<String>,
    ApiJson(req): ApiJson<HostRequest>,
) -> RoomResult<Json<RoomSnapshot>> {
    let snapshot = room(&state, &code)?.end_game(req.host_token).await?;
    Ok(Json(snapshot))
}
