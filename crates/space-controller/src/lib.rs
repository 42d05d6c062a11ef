//! Space Controller (SC) Service Library
//!
//! This library provides the core functionality for the Space Controller -
//! the session state service coordinating collaboration spaces layered on
//! an external WebRTC SFU:
//!
//! - Space and participant lifecycle (join/update/leave, ownership)
//! - Child-room allocation, including the assistant/customer pairing mode
//! - Usage-time ledger persisted independently of live records
//! - Periodic reconciliation against the SFU's authoritative roster
//!
//! # Architecture
//!
//! The SC follows the Handler -> Manager -> Store pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> managers/*.rs -> store/*.rs
//! ```
//!
//! The reconciliation loop (`tasks/reconciler.rs`) runs on a timer and
//! drives the same managers as the request handlers, so both paths share
//! one consistency discipline: fetch the whole space blob, mutate in
//! memory, write it back whole, re-deriving invariant-bearing fields on the
//! way out.
//!
//! # Key Design Decisions
//!
//! - **One blob per space**: all nested state travels with the record;
//!   last write wins, reconciliation corrects drift
//! - **Injected collaborators**: store, media backend and event bus are
//!   trait objects constructed in `main`, fakes in tests
//! - **Retryable pairing codes**: "please wait" outcomes are values, not
//!   errors
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `events` - Event bus (re-init signals over Redis pub/sub)
//! - `handlers` - HTTP request handlers
//! - `managers` - Participant/room/space managers and the usage ledger
//! - `media` - Media backend roster contract and HTTP client
//! - `models` - Data model (space blob, participants, rooms, usage)
//! - `observability` - Health endpoints and metrics
//! - `routes` - Axum router setup
//! - `store` - Session store contract and Redis implementation
//! - `tasks` - Reconciliation background task

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod managers;
pub mod media;
pub mod models;
pub mod observability;
pub mod routes;
pub mod store;
pub mod tasks;
