//! HTTP routes for the Space Controller.
//!
//! Defines the Axum router and application state.

use crate::handlers;
use crate::managers::{ParticipantManager, RoomAllocator, SpaceManager, UsageLedger};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub spaces: SpaceManager,
    pub participants: ParticipantManager,
    pub rooms: RoomAllocator,
    pub usage: UsageLedger,
}

/// Build the application routes.
///
/// Layer order (bottom-to-top execution):
/// 1. TimeoutLayer - bound the request (innermost)
/// 2. TraceLayer - log request details
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/v1/spaces",
            get(handlers::spaces::list_spaces).post(handlers::spaces::create_space),
        )
        .route(
            "/v1/spaces/:name",
            get(handlers::spaces::get_space).delete(handlers::spaces::delete_space),
        )
        .route(
            "/v1/spaces/:name/participants/:id",
            put(handlers::participants::upsert_participant)
                .delete(handlers::participants::remove_participant),
        )
        .route(
            "/v1/spaces/:name/owner",
            post(handlers::participants::transfer_ownership),
        )
        .route("/v1/spaces/:name/rooms", post(handlers::rooms::create_room))
        .route(
            "/v1/spaces/:name/rooms/:room",
            patch(handlers::rooms::update_room).delete(handlers::rooms::delete_room),
        )
        .route(
            "/v1/spaces/:name/rooms/:room/join",
            post(handlers::rooms::join_room),
        )
        .route(
            "/v1/spaces/:name/rooms/:room/leave",
            post(handlers::rooms::leave_room),
        )
        .route(
            "/v1/spaces/:name/rooms/:room/enter",
            post(handlers::rooms::enter_room),
        )
        .route("/v1/usage", get(handlers::usage::all_usage))
        .route("/v1/spaces/:name/usage", get(handlers::usage::space_usage))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
}
