//! Usage ledger handlers.
//!
//! - `GET /v1/usage` - Full ledger, keyed by space id
//! - `GET /v1/spaces/{name}/usage` - One space's ledger
//!
//! The ledger is readable for deleted spaces: history outlives the live
//! record.

use crate::errors::ScError;
use crate::models::UsageRecord;
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Handler for `GET /v1/usage`.
#[instrument(skip_all)]
pub async fn all_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HashMap<String, UsageRecord>>, ScError> {
    let ledger = state.usage.all().await?;
    Ok(Json(ledger))
}

/// Handler for `GET /v1/spaces/{name}/usage`.
#[instrument(skip_all, fields(space = %name))]
pub async fn space_usage(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<UsageRecord>, ScError> {
    let record = state
        .usage
        .for_space(&name)
        .await?
        .ok_or_else(|| ScError::NotFound(format!("no usage recorded for {name}")))?;
    Ok(Json(record))
}
