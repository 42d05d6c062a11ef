//! The space record: the unit of persistence in the session store.
//!
//! One serialized `Space` per name. All mutations are read-modify-write on
//! the whole blob; concurrent writers to the same space race (last write
//! wins). The invariant-bearing fields (owner identity, manager roster) are
//! re-derived on every write via [`Space::normalize`] so stale overwrites
//! tend to self-heal.

use crate::models::participant::{Identity, Participant};
use crate::models::room::ChildRoom;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound on the manager roster.
pub const MAX_MANAGERS: usize = 5;

/// Per-identity-class permission set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePolicy {
    /// Auto-provision a private child room ("{name}'s Room") on the
    /// participant's initial join.
    #[serde(default)]
    pub auto_private_room: bool,

    /// In persistent spaces, keep the record with `online = false` after a
    /// leave. Identity classes with `false` here (guests) are deleted
    /// outright.
    #[serde(default)]
    pub retain_offline: bool,
}

/// Recording state carried on the space record.
///
/// Recording integration itself is an external collaborator; the space only
/// tracks whether and by whom it was switched on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingState {
    #[serde(default)]
    pub active: bool,

    #[serde(default)]
    pub started_by: Option<String>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
}

/// A collaboration space. Maps 1:1 onto a room on the media backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    /// Space name, the record key.
    pub name: String,

    /// Participant id of the current owner.
    pub owner_id: String,

    /// Manager roster, derived from participant identities on every write.
    /// Never contains the owner, never exceeds [`MAX_MANAGERS`].
    #[serde(default)]
    pub managers: Vec<String>,

    /// Breakout rooms.
    #[serde(default)]
    pub rooms: Vec<ChildRoom>,

    /// Participants keyed by id.
    #[serde(default)]
    pub participants: HashMap<String, Participant>,

    /// Recording state.
    #[serde(default)]
    pub recording: RecordingState,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Persistent spaces keep participant and app data across disconnects.
    #[serde(default)]
    pub persistent: bool,

    /// Whether unauthenticated guests may join.
    #[serde(default)]
    pub allow_guests: bool,

    /// Apps enabled in this space.
    #[serde(default)]
    pub enabled_apps: Vec<String>,

    /// RBAC policy table keyed by identity class.
    #[serde(default = "default_policy_table")]
    pub policies: HashMap<Identity, RolePolicy>,
}

/// Default RBAC table: staff roles get an auto-provisioned private room,
/// guests are never retained offline.
#[must_use]
pub fn default_policy_table() -> HashMap<Identity, RolePolicy> {
    HashMap::from([
        (
            Identity::Owner,
            RolePolicy {
                auto_private_room: true,
                retain_offline: true,
            },
        ),
        (
            Identity::Manager,
            RolePolicy {
                auto_private_room: true,
                retain_offline: true,
            },
        ),
        (
            Identity::Customer,
            RolePolicy {
                auto_private_room: false,
                retain_offline: true,
            },
        ),
        (
            Identity::Guest,
            RolePolicy {
                auto_private_room: false,
                retain_offline: false,
            },
        ),
        (
            Identity::Participant,
            RolePolicy {
                auto_private_room: false,
                retain_offline: true,
            },
        ),
    ])
}

impl Space {
    /// Create a new space owned by `owner_id`.
    #[must_use]
    pub fn new(name: &str, owner_id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            managers: Vec::new(),
            rooms: Vec::new(),
            participants: HashMap::new(),
            recording: RecordingState::default(),
            created_at,
            persistent: false,
            allow_guests: true,
            enabled_apps: Vec::new(),
            policies: default_policy_table(),
        }
    }

    /// Policy for an identity class. Falls back to the built-in default
    /// table when a record predates a policy entry.
    #[must_use]
    pub fn policy_for(&self, identity: Identity) -> RolePolicy {
        self.policies.get(&identity).copied().unwrap_or(RolePolicy {
            auto_private_room: false,
            retain_offline: !matches!(identity, Identity::Guest),
        })
    }

    /// Find a child room by name.
    #[must_use]
    pub fn room(&self, name: &str) -> Option<&ChildRoom> {
        self.rooms.iter().find(|r| r.name == name)
    }

    /// Find a child room by name, mutably.
    pub fn room_mut(&mut self, name: &str) -> Option<&mut ChildRoom> {
        self.rooms.iter_mut().find(|r| r.name == name)
    }

    /// Remove a participant from every room it occupies.
    ///
    /// The invariant says at most one room holds it, but concurrent blob
    /// writes can violate that; this scans all rooms and returns how many
    /// memberships were stripped so the caller can log the repair.
    pub fn strip_from_rooms(&mut self, participant_id: &str) -> usize {
        let mut stripped = 0;
        for room in &mut self.rooms {
            if room.remove(participant_id) {
                stripped += 1;
            }
        }
        stripped
    }

    /// Re-derive the invariant-bearing fields before a write.
    ///
    /// - While non-empty, `owner_id` must refer to an existing participant;
    ///   a dangling owner is repaired by promoting an arbitrary remaining
    ///   participant.
    /// - Exactly the participant matching `owner_id` carries
    ///   `identity = owner`; impostors are demoted to `participant`.
    /// - The manager roster is rebuilt from participant identities, capped
    ///   at [`MAX_MANAGERS`] (excess demoted), never containing the owner.
    ///
    /// Returns the number of repairs applied (0 when already consistent).
    pub fn normalize(&mut self) -> usize {
        let mut repairs = 0;

        if !self.participants.is_empty() && !self.participants.contains_key(&self.owner_id) {
            if let Some(id) = self.participants.keys().next().cloned() {
                self.owner_id = id;
                repairs += 1;
            }
        }

        for participant in self.participants.values_mut() {
            if participant.id == self.owner_id {
                if participant.identity != Identity::Owner {
                    participant.identity = Identity::Owner;
                    repairs += 1;
                }
            } else if participant.identity == Identity::Owner {
                participant.identity = Identity::Participant;
                repairs += 1;
            }
        }

        // Rebuild the manager roster; sorted so the cap cuts deterministically.
        let mut manager_ids: Vec<String> = self
            .participants
            .values()
            .filter(|p| p.identity == Identity::Manager && p.id != self.owner_id)
            .map(|p| p.id.clone())
            .collect();
        manager_ids.sort();

        if manager_ids.len() > MAX_MANAGERS {
            for id in manager_ids.split_off(MAX_MANAGERS) {
                if let Some(p) = self.participants.get_mut(&id) {
                    p.identity = Identity::Participant;
                    repairs += 1;
                }
            }
        }

        if self.managers != manager_ids {
            self.managers = manager_ids;
        }

        repairs
    }

    /// Ids of participants currently recorded in the space.
    #[must_use]
    pub fn participant_ids(&self) -> Vec<String> {
        self.participants.keys().cloned().collect()
    }
}
