//! Space handlers.
//!
//! - `GET /v1/spaces` - List spaces (`?detail=true` for full records)
//! - `POST /v1/spaces` - Create a space (explicit, non-idempotent)
//! - `GET /v1/spaces/{name}` - Fetch one space
//! - `DELETE /v1/spaces/{name}` - Delete a space (usage history retained)

use crate::errors::ScError;
use crate::managers::{OwnerSeed, SpaceListing};
use crate::models::Space;
use crate::observability::metrics;
use crate::routes::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Query parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct ListSpacesQuery {
    #[serde(default)]
    pub detail: bool,
}

/// Request body for space creation.
#[derive(Debug, Deserialize)]
pub struct CreateSpaceRequest {
    pub name: String,
    pub owner: OwnerSeed,
}

/// Handler for `GET /v1/spaces`.
#[instrument(skip_all, fields(detail = query.detail))]
pub async fn list_spaces(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSpacesQuery>,
) -> Result<Json<SpaceListing>, ScError> {
    let listing = state.spaces.list_spaces(query.detail).await?;

    let count = match &listing {
        SpaceListing::Full(map) => map.len(),
        SpaceListing::Summary(map) => map.len(),
    };
    metrics::set_spaces_live(count);

    Ok(Json(listing))
}

/// Handler for `POST /v1/spaces`.
///
/// Creation is explicitly non-idempotent: a taken name returns 409 and the
/// existing record is untouched.
#[instrument(skip_all, fields(space = %request.name, owner_id = %request.owner.id))]
pub async fn create_space(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSpaceRequest>,
) -> Result<(StatusCode, Json<Space>), ScError> {
    if request.name.trim().is_empty() {
        return Err(ScError::BadRequest("space name must not be empty".to_string()));
    }

    let space = state.spaces.create_space(&request.name, &request.owner).await?;
    Ok((StatusCode::CREATED, Json(space)))
}

/// Handler for `GET /v1/spaces/{name}`.
#[instrument(skip_all, fields(space = %name))]
pub async fn get_space(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Space>, ScError> {
    let space = state.spaces.get_space(&name).await?;
    Ok(Json(space))
}

/// Handler for `DELETE /v1/spaces/{name}`.
#[instrument(skip_all, fields(space = %name))]
pub async fn delete_space(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ScError> {
    state.spaces.delete_space(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
