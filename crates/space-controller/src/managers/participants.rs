//! Participant lifecycle manager.
//!
//! Owns the join/update/leave path and the ownership invariant: every
//! non-empty space has exactly one participant with `identity = owner`.
//! Both request handlers and the reconciliation loop remove participants
//! through this manager, so cleanup rules (room stripping, usage windows,
//! ownership transfer, space deletion) apply identically on both paths.

use crate::errors::ScError;
use crate::managers::usage::UsageLedger;
use crate::models::{Participant, ParticipantPatch, Space};
use crate::store::SessionStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Result of a successful participant removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Participant removed (or flipped offline); the space lives on.
    Removed,
    /// Removal emptied the space and the whole record was deleted.
    SpaceCleared,
}

/// Manager for participant membership in spaces.
#[derive(Clone)]
pub struct ParticipantManager {
    store: Arc<dyn SessionStore>,
    usage: UsageLedger,
}

impl ParticipantManager {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, usage: UsageLedger) -> Self {
        Self { store, usage }
    }

    /// Create or update a participant record.
    ///
    /// Creates the space on first contact with an unknown name; the joiner
    /// becomes its owner regardless of the patch contents. The patch merges
    /// shallowly (top-level fields only) and the participant always comes
    /// out `online = true`.
    ///
    /// Only on `is_initial_join` is the RBAC policy consulted: identity
    /// classes with `auto_private_room` get a private child room named
    /// `"{name}'s Room"`. Usage windows open as a side effect: the
    /// participant's own window, and the space's window when the space is
    /// newly created.
    #[instrument(skip(self, patch), fields(space = %space_name, participant_id = %id, initial_join = is_initial_join))]
    pub async fn upsert_participant(
        &self,
        space_name: &str,
        id: &str,
        patch: &ParticipantPatch,
        is_initial_join: bool,
    ) -> Result<Participant, ScError> {
        let now = Utc::now();

        let (mut space, space_created) = match self.store.get_space(space_name).await? {
            Some(space) => (space, false),
            None => (Space::new(space_name, id, now), true),
        };

        let is_new = !space.participants.contains_key(id);
        let record = space
            .participants
            .entry(id.to_string())
            .or_insert_with(|| Participant::new(id, now));

        patch.apply(record);
        record.online = true;

        // Ownership is never patch-controlled: normalize forces the persisted
        // owner (or the first joiner of an empty space) to identity=owner and
        // demotes impostors.
        let repairs = space.normalize();
        if repairs > 0 {
            debug!(
                target: "sc.managers.participants",
                space = %space_name,
                repairs,
                "Repaired role invariants during upsert"
            );
        }

        let (identity, display_name) = space
            .participants
            .get(id)
            .map(|p| (p.identity, p.name.clone()))
            .ok_or_else(|| ScError::Internal("participant vanished during upsert".to_string()))?;

        if is_initial_join && space.policy_for(identity).auto_private_room {
            let room_name = format!("{display_name}'s Room");
            if space.room(&room_name).is_none() {
                // Created empty; the owner enters it through the normal
                // child-room path, which owns the one-room-at-a-time rule
                space
                    .rooms
                    .push(crate::models::ChildRoom::new(&room_name, id, true));
                debug!(
                    target: "sc.managers.participants",
                    space = %space_name,
                    room = %room_name,
                    "Auto-provisioned private room on initial join"
                );
            }
        }

        self.store.put_space(&space).await?;

        if space_created {
            self.usage.open_space_window(space_name).await?;
            info!(
                target: "sc.managers.participants",
                space = %space_name,
                owner_id = %id,
                "Created space on first join"
            );
        }
        if is_initial_join || is_new {
            self.usage
                .open_participant_window(space_name, &display_name)
                .await?;
        }

        space
            .participants
            .get(id)
            .cloned()
            .ok_or_else(|| ScError::Internal("participant vanished during upsert".to_string()))
    }

    /// Remove a participant from a space.
    ///
    /// Always strips the participant from every child room it occupies (the
    /// invariant says at most one, but the scan is defensive) and closes its
    /// usage window, then branches on the space's persistence flag:
    ///
    /// - persistent: identity classes without `retain_offline` (guests) are
    ///   deleted outright; everyone else flips to `online = false` and is
    ///   kept. An emptied participant map deletes the whole space.
    /// - non-persistent: deleted unconditionally. If the owner left and
    ///   others remain, ownership transfers to an arbitrary remaining
    ///   participant. If none remain, the space is deleted.
    #[instrument(skip(self), fields(space = %space_name, participant_id = %id))]
    pub async fn remove_participant(
        &self,
        space_name: &str,
        id: &str,
    ) -> Result<RemovalOutcome, ScError> {
        let Some(mut space) = self.store.get_space(space_name).await? else {
            return Err(ScError::NotFound(format!("space {space_name} not found")));
        };

        let Some(leaving) = space.participants.get(id).cloned() else {
            return Err(ScError::NotFound(format!(
                "participant {id} not found in {space_name}"
            )));
        };

        let stripped = space.strip_from_rooms(id);
        if stripped > 1 {
            warn!(
                target: "sc.managers.participants",
                space = %space_name,
                participant_id = %id,
                rooms = stripped,
                "Participant occupied multiple rooms; healed"
            );
        }

        self.usage
            .close_participant_window(space_name, &leaving.name)
            .await?;

        if space.persistent {
            if space.policy_for(leaving.identity).retain_offline {
                if let Some(record) = space.participants.get_mut(id) {
                    record.online = false;
                }
            } else {
                space.participants.remove(id);
                debug!(
                    target: "sc.managers.participants",
                    space = %space_name,
                    participant_id = %id,
                    "Deleted non-retained participant from persistent space"
                );
            }

            if space.participants.is_empty() {
                return self.clear_space(&space).await;
            }

            space.normalize();
            self.store.put_space(&space).await?;
            return Ok(RemovalOutcome::Removed);
        }

        space.participants.remove(id);

        if space.participants.is_empty() {
            return self.clear_space(&space).await;
        }

        if space.owner_id == id {
            // normalize() picks the replacement; log the handover
            let repairs = space.normalize();
            info!(
                target: "sc.managers.participants",
                space = %space_name,
                old_owner = %id,
                new_owner = %space.owner_id,
                repairs,
                "Owner left; transferred ownership to remaining participant"
            );
        } else {
            space.normalize();
        }

        self.store.put_space(&space).await?;
        Ok(RemovalOutcome::Removed)
    }

    /// Transfer ownership to another participant.
    ///
    /// Returns `false` without side effects when either the current owner or
    /// the new owner is missing from the space. The displaced owner's new
    /// identity follows its platform tag: `other` becomes a guest, the
    /// service platform becomes a customer, everything else a participant.
    #[instrument(skip(self), fields(space = %space_name, new_owner_id = %new_owner_id))]
    pub async fn transfer_owner(
        &self,
        space_name: &str,
        new_owner_id: &str,
    ) -> Result<bool, ScError> {
        let Some(mut space) = self.store.get_space(space_name).await? else {
            return Ok(false);
        };

        let old_owner_id = space.owner_id.clone();
        if !space.participants.contains_key(&old_owner_id)
            || !space.participants.contains_key(new_owner_id)
        {
            return Ok(false);
        }

        if old_owner_id == new_owner_id {
            return Ok(true);
        }

        if let Some(old_owner) = space.participants.get_mut(&old_owner_id) {
            old_owner.identity = old_owner.platform.demoted_identity();
        }

        space.owner_id = new_owner_id.to_string();
        // Re-derives the owner auth on the new id (and would mint it even if
        // the identity record lagged behind)
        space.normalize();
        self.store.put_space(&space).await?;

        info!(
            target: "sc.managers.participants",
            space = %space_name,
            old_owner = %old_owner_id,
            new_owner = %new_owner_id,
            "Transferred ownership"
        );

        Ok(true)
    }

    async fn clear_space(&self, space: &Space) -> Result<RemovalOutcome, ScError> {
        self.store.remove_space(&space.name).await?;
        self.usage.close_all(&space.name).await?;
        info!(
            target: "sc.managers.participants",
            space = %space.name,
            "Last participant left; deleted space"
        );
        Ok(RemovalOutcome::SpaceCleared)
    }
}
