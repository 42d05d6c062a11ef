//! HTTP API integration tests.
//!
//! Drives the Axum router over the in-memory fakes with `tower::ServiceExt`
//! oneshot calls: status-code mapping for the error taxonomy, and the
//! retryable pairing codes rendering as 200s.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sc_test_utils::MemoryStore;
use serde_json::{json, Value};
use space_controller::managers::{
    ParticipantManager, RoomAllocator, SpaceManager, UsageLedger,
};
use space_controller::routes::{build_routes, AppState};
use std::sync::Arc;
use tower::ServiceExt;

fn app(store: &Arc<MemoryStore>) -> Router {
    let usage = UsageLedger::new(store.clone());
    let participants = ParticipantManager::new(store.clone(), usage.clone());
    let rooms = RoomAllocator::new(store.clone());
    let spaces = SpaceManager::new(store.clone(), usage.clone());

    build_routes(Arc::new(AppState {
        spaces,
        participants,
        rooms,
        usage,
    }))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn create_space_body(name: &str, owner_id: &str) -> Value {
    json!({ "name": name, "owner": { "id": owner_id } })
}

#[tokio::test]
async fn test_create_space_then_conflict() {
    let store = MemoryStore::shared();
    let app = app(&store);

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "alice")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["owner_id"], "alice");

    let response = app
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "bob")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_get_space_and_not_found() {
    let store = MemoryStore::shared();
    let app = app(&store);

    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "alice")),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(Method::GET, "/v1/spaces/atrium", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "atrium");

    let response = app
        .oneshot(request(Method::GET, "/v1/spaces/void", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_upsert_and_remove_participant() {
    let store = MemoryStore::shared();
    let app = app(&store);

    // Upsert against an unknown space creates it; joiner forced to owner
    let response = app
        .clone()
        .oneshot(request(
            Method::PUT,
            "/v1/spaces/atrium/participants/alice",
            Some(json!({ "name": "Alice", "identity": "guest", "initial_join": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["identity"], "owner");
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["online"], true);

    let response = app
        .clone()
        .oneshot(request(
            Method::DELETE,
            "/v1/spaces/atrium/participants/alice",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["removed"], true);
    assert_eq!(body["space_cleared"], true);

    // Removing again: the space is gone
    let response = app
        .oneshot(request(
            Method::DELETE,
            "/v1/spaces/atrium/participants/alice",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pairing_wait_codes_are_not_errors() {
    let store = MemoryStore::shared();
    let app = app(&store);

    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("support", "asst")),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(request(
            Method::PUT,
            "/v1/spaces/support/participants/cust",
            Some(json!({ "identity": "customer", "initial_join": true })),
        ))
        .await
        .unwrap();

    // Customer arrives before the assistant created the room: 200 with a
    // retryable code, never a hard error
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces/support/rooms/Help/enter",
            Some(json!({ "participant_id": "cust", "pairing": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "wait_room_not_ready");

    // Assistant opens the room, customer retries and lands in it
    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces/support/rooms/Help/enter",
            Some(json!({ "participant_id": "asst", "pairing": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(request(
            Method::POST,
            "/v1/spaces/support/rooms/Help/enter",
            Some(json!({ "participant_id": "cust", "pairing": true })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "joined");
    assert_eq!(body["room"], "Help");
}

#[tokio::test]
async fn test_transfer_ownership_endpoint() {
    let store = MemoryStore::shared();
    let app = app(&store);

    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "alice")),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(request(
            Method::PUT,
            "/v1/spaces/atrium/participants/bob",
            Some(json!({ "initial_join": true })),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces/atrium/owner",
            Some(json!({ "new_owner_id": "bob" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["transferred"], true);

    let response = app
        .oneshot(request(
            Method::POST,
            "/v1/spaces/atrium/owner",
            Some(json!({ "new_owner_id": "nobody" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["transferred"], false);
}

#[tokio::test]
async fn test_usage_endpoint_survives_deletion() {
    let store = MemoryStore::shared();
    let app = app(&store);

    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "alice")),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, "/v1/spaces/atrium", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request(Method::GET, "/v1/spaces/atrium/usage", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["windows"].as_array().is_some_and(|w| !w.is_empty()));
}

#[tokio::test]
async fn test_update_room_requires_changes() {
    let store = MemoryStore::shared();
    let app = app(&store);

    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces",
            Some(create_space_body("atrium", "alice")),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(request(
            Method::POST,
            "/v1/spaces/atrium/rooms",
            Some(json!({ "name": "huddle", "owner_id": "alice" })),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(request(
            Method::PATCH,
            "/v1/spaces/atrium/rooms/huddle",
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
