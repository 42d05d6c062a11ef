//! # SC Test Utilities
//!
//! Shared test utilities for the Space Controller service.
//!
//! This crate provides fake implementations and test fixtures for isolated
//! SC testing without requiring real infrastructure (no Redis, no SFU).
//!
//! ## Modules
//!
//! - `memory_store` - In-memory session store fake
//! - `mock_media` - Scripted media backend (rooms, rosters, failure toggles)
//! - `mock_events` - Event bus that records emitted signals
//! - `fixtures` - Pre-configured test data (spaces, participants)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sc_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let store = MemoryStore::shared();
//!     let media = MockMediaBackend::new().with_roster("atrium", &["alice"]);
//!     let events = RecordingEventBus::shared();
//!
//!     // Run your test...
//! }
//! ```

pub mod fixtures;
pub mod memory_store;
pub mod mock_events;
pub mod mock_media;

pub use fixtures::{participant_with_identity, space_with_participants};
pub use memory_store::MemoryStore;
pub use mock_events::RecordingEventBus;
pub use mock_media::MockMediaBackend;
