//! Participant records and the identity/platform taxonomy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identity class of a participant within a space.
///
/// Role transitions: `guest|customer|participant -> manager -> owner`.
/// A transition into `Owner` always displaces the prior owner; a transition
/// away from `Owner` only happens during an ownership transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    Owner,
    Manager,
    Customer,
    Guest,
    Participant,
}

impl Default for Identity {
    fn default() -> Self {
        Identity::Participant
    }
}

/// Originating platform of a participant's client.
///
/// Closed set: adding a platform is a compile-time decision, and every
/// match over it is exhaustive (no silent fallthrough on new tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Web,
    Desktop,
    /// The service platform (staff consoles connect through it).
    Portal,
    Other,
}

impl Default for Platform {
    fn default() -> Self {
        Platform::Web
    }
}

impl Platform {
    /// Identity a displaced owner falls back to, keyed by where its
    /// client connected from.
    #[must_use]
    pub fn demoted_identity(self) -> Identity {
        match self {
            Platform::Other => Identity::Guest,
            Platform::Portal => Identity::Customer,
            Platform::Web | Platform::Desktop => Identity::Participant,
        }
    }
}

/// A participant record inside a space.
///
/// Keyed by `id` in [`crate::models::Space::participants`]. The record with
/// `online = false` is retained only in persistent spaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Stable participant identifier (matches the media backend identity).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Whether the participant currently has a live connection.
    #[serde(default)]
    pub online: bool,

    /// Identity class, drives the RBAC policy lookup.
    #[serde(default)]
    pub identity: Identity,

    /// Originating platform tag.
    #[serde(default)]
    pub platform: Platform,

    /// Per-app sync flags (app id -> enabled).
    #[serde(default)]
    pub app_sync: HashMap<String, bool>,

    /// Opaque per-app data blobs.
    #[serde(default)]
    pub app_data: HashMap<String, serde_json::Value>,

    /// Session handle assigned by the media backend, if known.
    #[serde(default)]
    pub session_id: Option<String>,

    /// When the participant first joined this space.
    pub joined_at: DateTime<Utc>,

    /// Raised-hand flag.
    #[serde(default)]
    pub hand_raised: bool,
}

impl Participant {
    /// Create a fresh participant record with defaults.
    ///
    /// The display name starts as the id until a patch provides one.
    #[must_use]
    pub fn new(id: &str, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            online: false,
            identity: Identity::default(),
            platform: Platform::default(),
            app_sync: HashMap::new(),
            app_data: HashMap::new(),
            session_id: None,
            joined_at,
            hand_raised: false,
        }
    }
}

/// Shallow patch applied to a participant on upsert.
///
/// Only top-level fields merge: a provided map replaces the stored map
/// wholesale, there is no deep merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_sync: Option<HashMap<String, bool>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_data: Option<HashMap<String, serde_json::Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_raised: Option<bool>,
}

impl ParticipantPatch {
    /// Merge this patch into an existing record. Unspecified fields are
    /// left unchanged.
    pub fn apply(&self, target: &mut Participant) {
        if let Some(name) = &self.name {
            target.name = name.clone();
        }
        if let Some(identity) = self.identity {
            target.identity = identity;
        }
        if let Some(platform) = self.platform {
            target.platform = platform;
        }
        if let Some(app_sync) = &self.app_sync {
            target.app_sync = app_sync.clone();
        }
        if let Some(app_data) = &self.app_data {
            target.app_data = app_data.clone();
        }
        if let Some(session_id) = &self.session_id {
            target.session_id = Some(session_id.clone());
        }
        if let Some(hand_raised) = self.hand_raised {
            target.hand_raised = hand_raised;
        }
    }
}
