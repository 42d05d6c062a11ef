//! Participant handlers.
//!
//! - `PUT /v1/spaces/{name}/participants/{id}` - Upsert a participant
//! - `DELETE /v1/spaces/{name}/participants/{id}` - Remove a participant
//! - `POST /v1/spaces/{name}/owner` - Transfer ownership

use crate::errors::ScError;
use crate::managers::RemovalOutcome;
use crate::models::{Participant, ParticipantPatch};
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Request body for the upsert endpoint: the participant patch plus the
/// initial-join marker that gates RBAC room provisioning and the usage
/// window.
#[derive(Debug, Deserialize)]
pub struct UpsertParticipantRequest {
    #[serde(flatten)]
    pub patch: ParticipantPatch,

    #[serde(default)]
    pub initial_join: bool,
}

/// Response for a participant removal.
#[derive(Debug, Serialize)]
pub struct RemoveParticipantResponse {
    pub removed: bool,
    /// Set when the removal emptied the space and the record was deleted.
    pub space_cleared: bool,
}

/// Request body for ownership transfer.
#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: String,
}

/// Response for ownership transfer.
#[derive(Debug, Serialize)]
pub struct TransferOwnershipResponse {
    pub transferred: bool,
}

/// Handler for `PUT /v1/spaces/{name}/participants/{id}`.
///
/// Creates the space on first contact with an unknown name; the joiner
/// becomes its owner.
#[instrument(skip_all, fields(space = %name, participant_id = %id, initial_join = request.initial_join))]
pub async fn upsert_participant(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
    Json(request): Json<UpsertParticipantRequest>,
) -> Result<Json<Participant>, ScError> {
    let participant = state
        .participants
        .upsert_participant(&name, &id, &request.patch, request.initial_join)
        .await?;
    Ok(Json(participant))
}

/// Handler for `DELETE /v1/spaces/{name}/participants/{id}`.
#[instrument(skip_all, fields(space = %name, participant_id = %id))]
pub async fn remove_participant(
    State(state): State<Arc<AppState>>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<RemoveParticipantResponse>, ScError> {
    let outcome = state.participants.remove_participant(&name, &id).await?;

    Ok(Json(RemoveParticipantResponse {
        removed: true,
        space_cleared: outcome == RemovalOutcome::SpaceCleared,
    }))
}

/// Handler for `POST /v1/spaces/{name}/owner`.
///
/// `transferred = false` means one of the two ids is missing; no state
/// changed.
#[instrument(skip_all, fields(space = %name, new_owner_id = %request.new_owner_id))]
pub async fn transfer_ownership(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<TransferOwnershipRequest>,
) -> Result<Json<TransferOwnershipResponse>, ScError> {
    let transferred = state
        .participants
        .transfer_owner(&name, &request.new_owner_id)
        .await?;
    Ok(Json(TransferOwnershipResponse { transferred }))
}
