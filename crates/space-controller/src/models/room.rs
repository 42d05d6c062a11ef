//! Child (breakout) rooms nested inside a space.

use serde::{Deserialize, Serialize};

/// A breakout room. Name is unique within its space.
///
/// Occupancy is a set: `participants` never holds duplicates. A participant
/// belongs to at most one child room at a time; the managers repair that
/// invariant defensively when they touch a space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildRoom {
    /// Room name, unique within the space.
    pub name: String,

    /// Participant id of the room's owner.
    pub owner_id: String,

    /// Private rooms are excluded from open joining in pairing mode.
    #[serde(default)]
    pub private: bool,

    /// Ids of the current occupants.
    #[serde(default)]
    pub participants: Vec<String>,
}

impl ChildRoom {
    /// Create a room with a single occupant set.
    #[must_use]
    pub fn new(name: &str, owner_id: &str, private: bool) -> Self {
        Self {
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            private,
            participants: Vec::new(),
        }
    }

    /// Whether the given participant occupies this room.
    #[must_use]
    pub fn contains(&self, participant_id: &str) -> bool {
        self.participants.iter().any(|p| p == participant_id)
    }

    /// Add an occupant, keeping set semantics.
    pub fn add(&mut self, participant_id: &str) {
        if !self.contains(participant_id) {
            self.participants.push(participant_id.to_string());
        }
    }

    /// Remove an occupant. Returns whether it was present.
    pub fn remove(&mut self, participant_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != participant_id);
        self.participants.len() != before
    }

    /// Current occupant count.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.participants.len()
    }
}
