//! Data model for the Space Controller.
//!
//! A [`Space`] is the unit of persistence: one serialized record per space
//! name in the session store, mutated with a read-modify-write discipline.
//! Everything nested in it (participants, child rooms, policies) travels
//! with the blob.
//!
//! # Modules
//!
//! - [`space`] - The space record and its invariant repair helpers
//! - [`participant`] - Participant records, identity/platform enums, patches
//! - [`room`] - Child (breakout) rooms
//! - [`usage`] - Usage-time ledger, persisted independently of the space

pub mod participant;
pub mod room;
pub mod space;
pub mod usage;

pub use participant::{Identity, Participant, ParticipantPatch, Platform};
pub use room::ChildRoom;
pub use space::{RecordingState, RolePolicy, Space, MAX_MANAGERS};
pub use usage::{UsageRecord, UsageWindow};
