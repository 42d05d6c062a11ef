//! Space lifecycle manager.
//!
//! Explicit create/delete plus the read side of the exposed operations.
//! Deletion cascades the live record and chat history but never the usage
//! ledger: per-space usage history is retained permanently, indexed by space
//! id, independent of the live record's lifetime.

use crate::errors::ScError;
use crate::managers::usage::UsageLedger;
use crate::models::{Identity, Participant, ParticipantPatch, Platform, Space};
use crate::store::SessionStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Seed data for the owner of an explicitly created space.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerSeed {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub platform: Option<Platform>,
}

/// Listing shapes for the exposed `list` operation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SpaceListing {
    /// Full space records keyed by name.
    Full(HashMap<String, Space>),
    /// Participant ids per space name.
    Summary(HashMap<String, Vec<String>>),
}

/// Manager for whole-space lifecycle.
#[derive(Clone)]
pub struct SpaceManager {
    store: Arc<dyn SessionStore>,
    usage: UsageLedger,
}

impl SpaceManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, usage: UsageLedger) -> Self {
        Self { store, usage }
    }

    /// Create a space with a seeded owner.
    ///
    /// Idempotent creation is explicitly rejected: a taken name is a
    /// distinct `Conflict`, and the existing record is left untouched.
    #[instrument(skip(self, owner), fields(space = %name, owner_id = %owner.id))]
    pub async fn create_space(&self, name: &str, owner: &OwnerSeed) -> Result<Space, ScError> {
        if self.store.space_exists(name).await? {
            return Err(ScError::Conflict(format!("space {name} already exists")));
        }

        let now = Utc::now();
        let mut space = Space::new(name, &owner.id, now);

        let mut record = Participant::new(&owner.id, now);
        let patch = ParticipantPatch {
            name: owner.name.clone(),
            platform: owner.platform,
            identity: Some(Identity::Owner),
            ..ParticipantPatch::default()
        };
        patch.apply(&mut record);
        record.online = true;
        let display_name = record.name.clone();
        space.participants.insert(owner.id.clone(), record);
        space.normalize();

        self.store.put_space(&space).await?;
        self.usage.open_space_window(name).await?;
        self.usage
            .open_participant_window(name, &display_name)
            .await?;

        info!(target: "sc.managers.spaces", space = %name, owner_id = %owner.id, "Created space");
        Ok(space)
    }

    /// Delete a space: live record and chat history go, a closing entry is
    /// appended to the usage ledger, and the ledger itself is retained.
    #[instrument(skip(self), fields(space = %name))]
    pub async fn delete_space(&self, name: &str) -> Result<(), ScError> {
        if !self.store.space_exists(name).await? {
            return Err(ScError::NotFound(format!("space {name} not found")));
        }

        self.store.remove_space(name).await?;
        self.usage.close_all(name).await?;

        info!(target: "sc.managers.spaces", space = %name, "Deleted space");
        Ok(())
    }

    /// Fetch a space record.
    #[instrument(skip(self), fields(space = %name))]
    pub async fn get_space(&self, name: &str) -> Result<Space, ScError> {
        self.store
            .get_space(name)
            .await?
            .ok_or_else(|| ScError::NotFound(format!("space {name} not found")))
    }

    /// List all spaces, either full records or the participant-id summary.
    ///
    /// Index entries whose record vanished between the index read and the
    /// record read (concurrent deletion) are skipped, not errors.
    #[instrument(skip(self), fields(detail = detail))]
    pub async fn list_spaces(&self, detail: bool) -> Result<SpaceListing, ScError> {
        let names = self.store.space_names().await?;

        if detail {
            let mut spaces = HashMap::new();
            for name in names {
                if let Some(space) = self.store.get_space(&name).await? {
                    spaces.insert(name, space);
                }
            }
            Ok(SpaceListing::Full(spaces))
        } else {
            let mut summary = HashMap::new();
            for name in names {
                if let Some(space) = self.store.get_space(&name).await? {
                    summary.insert(name, space.participant_ids());
                }
            }
            Ok(SpaceListing::Summary(summary))
        }
    }
}
