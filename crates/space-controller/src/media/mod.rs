//! Media backend contract.
//!
//! The SFU is an opaque collaborator and the sole source of truth for "who
//! is actually connected". This module defines the read-only roster contract
//! the reconciliation loop consumes, plus the HTTP implementation.

mod http;

pub use self::http::HttpMediaBackend;

use crate::errors::ScError;
use async_trait::async_trait;
use serde::Deserialize;

/// A room known to the media backend.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaRoom {
    pub name: String,
}

/// A connected participant as reported by the media backend.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaParticipant {
    /// Participant identity, matching [`crate::models::Participant::id`].
    pub identity: String,
}

/// Read contract against the media backend.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// All rooms the backend currently knows about.
    async fn list_rooms(&self) -> Result<Vec<MediaRoom>, ScError>;

    /// Authoritative roster of connected participants for one room.
    async fn list_participants(&self, space: &str) -> Result<Vec<MediaParticipant>, ScError>;
}
