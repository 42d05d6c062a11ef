//! Child-room handlers.
//!
//! - `POST /v1/spaces/{name}/rooms` - Create a room
//! - `PATCH /v1/spaces/{name}/rooms/{room}` - Rename / set privacy
//! - `DELETE /v1/spaces/{name}/rooms/{room}` - Delete a room
//! - `POST /v1/spaces/{name}/rooms/{room}/join` - Add a participant
//! - `POST /v1/spaces/{name}/rooms/{room}/leave` - Remove a participant
//! - `POST /v1/spaces/{name}/rooms/{room}/enter` - Join with optional
//!   pairing semantics
//!
//! The enter endpoint always answers 200: the two "please wait" outcomes
//! are retryable codes in the body, never hard errors.

use crate::errors::ScError;
use crate::managers::RoomJoinOutcome;
use crate::models::ChildRoom;
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Request body for room creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub owner_id: String,

    #[serde(default)]
    pub private: bool,
}

/// Request body for room updates. All fields optional; at least one must be
/// provided.
#[derive(Debug, Deserialize)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub new_name: Option<String>,

    #[serde(default)]
    pub private: Option<bool>,
}

impl UpdateRoomRequest {
    fn has_changes(&self) -> bool {
        self.new_name.is_some() || self.private.is_some()
    }
}

/// Request body for join/leave.
#[derive(Debug, Deserialize)]
pub struct RoomMembershipRequest {
    pub participant_id: String,
}

/// Request body for the enter endpoint.
#[derive(Debug, Deserialize)]
pub struct EnterRoomRequest {
    pub participant_id: String,

    /// Pairing mode: one assistant matched with one customer.
    #[serde(default)]
    pub pairing: bool,
}

/// Response for the enter endpoint.
#[derive(Debug, Serialize)]
pub struct EnterRoomResponse {
    /// `joined`, `wait_room_full`, or `wait_room_not_ready`.
    pub status: &'static str,

    /// The room actually joined; may differ from the one requested when
    /// pairing redirects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl From<RoomJoinOutcome> for EnterRoomResponse {
    fn from(outcome: RoomJoinOutcome) -> Self {
        match outcome {
            RoomJoinOutcome::Joined { room } => Self {
                status: "joined",
                room: Some(room),
            },
            RoomJoinOutcome::WaitRoomFull => Self {
                status: "wait_room_full",
                room: None,
            },
            RoomJoinOutcome::WaitRoomNotReady => Self {
                status: "wait_room_not_ready",
                room: None,
            },
        }
    }
}

/// Handler for `POST /v1/spaces/{name}/rooms`.
#[instrument(skip_all, fields(space = %name, room = %request.name))]
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ChildRoom>), ScError> {
    if request.name.trim().is_empty() {
        return Err(ScError::BadRequest("room name must not be empty".to_string()));
    }

    let room = state
        .rooms
        .create_room(&name, &request.name, &request.owner_id, request.private)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// Handler for `PATCH /v1/spaces/{name}/rooms/{room}`.
#[instrument(skip_all, fields(space = %name, room = %room))]
pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path((name, room)): Path<(String, String)>,
    Json(request): Json<UpdateRoomRequest>,
) -> Result<StatusCode, ScError> {
    if !request.has_changes() {
        return Err(ScError::BadRequest("No changes provided".to_string()));
    }

    if let Some(private) = request.private {
        state.rooms.set_privacy(&name, &room, private).await?;
    }

    if let Some(new_name) = &request.new_name {
        if new_name.trim().is_empty() {
            return Err(ScError::BadRequest("room name must not be empty".to_string()));
        }
        state.rooms.rename_room(&name, &room, new_name).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `DELETE /v1/spaces/{name}/rooms/{room}`.
#[instrument(skip_all, fields(space = %name, room = %room))]
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path((name, room)): Path<(String, String)>,
) -> Result<StatusCode, ScError> {
    state.rooms.delete_room(&name, &room).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /v1/spaces/{name}/rooms/{room}/join`.
#[instrument(skip_all, fields(space = %name, room = %room, participant_id = %request.participant_id))]
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path((name, room)): Path<(String, String)>,
    Json(request): Json<RoomMembershipRequest>,
) -> Result<StatusCode, ScError> {
    state
        .rooms
        .add_participant(&name, &room, &request.participant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /v1/spaces/{name}/rooms/{room}/leave`.
#[instrument(skip_all, fields(space = %name, room = %room, participant_id = %request.participant_id))]
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path((name, room)): Path<(String, String)>,
    Json(request): Json<RoomMembershipRequest>,
) -> Result<StatusCode, ScError> {
    state
        .rooms
        .remove_participant(&name, &room, &request.participant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `POST /v1/spaces/{name}/rooms/{room}/enter`.
#[instrument(skip_all, fields(space = %name, room = %room, participant_id = %request.participant_id, pairing = request.pairing))]
pub async fn enter_room(
    State(state): State<Arc<AppState>>,
    Path((name, room)): Path<(String, String)>,
    Json(request): Json<EnterRoomRequest>,
) -> Result<Json<EnterRoomResponse>, ScError> {
    let outcome = state
        .rooms
        .enter_room(&name, &room, &request.participant_id, request.pairing)
        .await?;
    Ok(Json(EnterRoomResponse::from(outcome)))
}
