//! Manager components.
//!
//! Request handlers and the reconciliation loop both drive these managers,
//! so every mutation path shares one consistency discipline: fetch the full
//! space blob, mutate in memory, write it back whole, re-deriving the
//! invariant-bearing fields on the way out.
//!
//! # Modules
//!
//! - [`participants`] - Join/update/remove, ownership enforcement and transfer
//! - [`rooms`] - Child-room allocator, including the pairing algorithm
//! - [`spaces`] - Space create/delete, listing
//! - [`usage`] - Usage-time ledger, persisted independently of the space

pub mod participants;
pub mod rooms;
pub mod spaces;
pub mod usage;

pub use participants::{ParticipantManager, RemovalOutcome};
pub use rooms::{RoomAllocator, RoomJoinOutcome};
pub use spaces::{OwnerSeed, SpaceListing, SpaceManager};
pub use usage::UsageLedger;
