//! Child-room allocator.
//!
//! Generic breakout-room operations plus the pairing algorithm: a
//! decentralized way for a many-to-one assistant pool to match one assistant
//! with one customer without a matchmaking service. Every operation loads
//! the full space, mutates in memory, and writes the whole blob back; there
//! are no partial-field store updates.
//!
//! Cost of a pairing join is O(child-room count), acceptable because room
//! counts are bounded by participant counts.

use crate::errors::ScError;
use crate::models::{ChildRoom, Identity, Space};
use crate::store::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of a room join.
///
/// The wait variants are retryable "please wait" codes, not errors: the
/// caller is expected to poll or back off, never to surface them as
/// failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomJoinOutcome {
    /// Joined the named room (possibly a redirect target, not the one
    /// asked for).
    Joined { room: String },
    /// Target room is full and no free paired room exists yet.
    WaitRoomFull,
    /// Target room has not been created by its assistant yet.
    WaitRoomNotReady,
}

/// Manager for child rooms within a space.
#[derive(Clone)]
pub struct RoomAllocator {
    store: Arc<dyn SessionStore>,
}

impl RoomAllocator {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    async fn load(&self, space_name: &str) -> Result<Space, ScError> {
        self.store
            .get_space(space_name)
            .await?
            .ok_or_else(|| ScError::NotFound(format!("space {space_name} not found")))
    }

    fn require_participant(space: &Space, id: &str) -> Result<(), ScError> {
        if space.participants.contains_key(id) {
            Ok(())
        } else {
            Err(ScError::NotFound(format!(
                "participant {id} not found in {}",
                space.name
            )))
        }
    }

    /// Create a room. Fails with `Conflict` if the name is taken.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name))]
    pub async fn create_room(
        &self,
        space_name: &str,
        room_name: &str,
        owner_id: &str,
        private: bool,
    ) -> Result<ChildRoom, ScError> {
        let mut space = self.load(space_name).await?;
        Self::require_participant(&space, owner_id)?;

        if space.room(room_name).is_some() {
            return Err(ScError::Conflict(format!(
                "room {room_name} already exists in {space_name}"
            )));
        }

        let room = ChildRoom::new(room_name, owner_id, private);
        space.rooms.push(room.clone());
        space.normalize();
        self.store.put_space(&space).await?;

        debug!(target: "sc.managers.rooms", space = %space_name, room = %room_name, "Created room");
        Ok(room)
    }

    /// Rename a room, with a collision check against existing names.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name, new_name = %new_name))]
    pub async fn rename_room(
        &self,
        space_name: &str,
        room_name: &str,
        new_name: &str,
    ) -> Result<(), ScError> {
        let mut space = self.load(space_name).await?;

        if room_name != new_name && space.room(new_name).is_some() {
            return Err(ScError::Conflict(format!(
                "room {new_name} already exists in {space_name}"
            )));
        }

        let room = space
            .room_mut(room_name)
            .ok_or_else(|| ScError::NotFound(format!("room {room_name} not found")))?;
        room.name = new_name.to_string();

        self.store.put_space(&space).await
    }

    /// Delete a room. Rooms are only ever deleted explicitly.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name))]
    pub async fn delete_room(&self, space_name: &str, room_name: &str) -> Result<(), ScError> {
        let mut space = self.load(space_name).await?;

        let before = space.rooms.len();
        space.rooms.retain(|r| r.name != room_name);
        if space.rooms.len() == before {
            return Err(ScError::NotFound(format!("room {room_name} not found")));
        }

        self.store.put_space(&space).await
    }

    /// Flip a room's privacy flag.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name, private = private))]
    pub async fn set_privacy(
        &self,
        space_name: &str,
        room_name: &str,
        private: bool,
    ) -> Result<(), ScError> {
        let mut space = self.load(space_name).await?;

        let room = space
            .room_mut(room_name)
            .ok_or_else(|| ScError::NotFound(format!("room {room_name} not found")))?;
        room.private = private;

        self.store.put_space(&space).await
    }

    /// Add a participant to a room. `Conflict` when already in the target.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name, participant_id = %id))]
    pub async fn add_participant(
        &self,
        space_name: &str,
        room_name: &str,
        id: &str,
    ) -> Result<(), ScError> {
        let mut space = self.load(space_name).await?;
        Self::require_participant(&space, id)?;

        let room = space
            .room_mut(room_name)
            .ok_or_else(|| ScError::NotFound(format!("room {room_name} not found")))?;

        if room.contains(id) {
            return Err(ScError::Conflict(format!(
                "participant {id} already in room {room_name}"
            )));
        }
        room.add(id);

        self.store.put_space(&space).await
    }

    /// Remove a participant from a room.
    #[instrument(skip(self), fields(space = %space_name, room = %room_name, participant_id = %id))]
    pub async fn remove_participant(
        &self,
        space_name: &str,
        room_name: &str,
        id: &str,
    ) -> Result<(), ScError> {
        let mut space = self.load(space_name).await?;

        let room = space
            .room_mut(room_name)
            .ok_or_else(|| ScError::NotFound(format!("room {room_name} not found")))?;

        if !room.remove(id) {
            return Err(ScError::NotFound(format!(
                "participant {id} not in room {room_name}"
            )));
        }

        self.store.put_space(&space).await
    }

    /// Enter a room, optionally with pairing semantics.
    ///
    /// Non-pairing mode is an unconditional join-or-create; it does not
    /// evict the participant from a prior room (caller's responsibility).
    ///
    /// Pairing mode matches one assistant with one customer. Customers are
    /// participants with `identity = customer`; everyone else takes the
    /// assistant path.
    ///
    /// Assistant entering target `R`:
    /// - `R` exists and is owned by this assistant: if it already has
    ///   occupants, reset the occupant set to just the assistant and force
    ///   it private (evicts a leftover customer); otherwise add the
    ///   assistant.
    /// - otherwise: create a private room `R` with the assistant as owner
    ///   and sole occupant.
    ///
    /// Customer entering target `R`:
    /// - `R` missing: retryable [`RoomJoinOutcome::WaitRoomNotReady`].
    /// - occupancy < 2: join `R`.
    /// - full: scan for any private room with exactly one occupant owned by
    ///   a *different* assistant and join that; otherwise retryable
    ///   [`RoomJoinOutcome::WaitRoomFull`].
    #[instrument(skip(self), fields(space = %space_name, room = %room_name, participant_id = %id, pairing = pairing))]
    pub async fn enter_room(
        &self,
        space_name: &str,
        room_name: &str,
        id: &str,
        pairing: bool,
    ) -> Result<RoomJoinOutcome, ScError> {
        let mut space = self.load(space_name).await?;
        Self::require_participant(&space, id)?;

        if !pairing {
            if let Some(room) = space.room_mut(room_name) {
                room.add(id);
            } else {
                let mut room = ChildRoom::new(room_name, id, false);
                room.add(id);
                space.rooms.push(room);
            }
            self.store.put_space(&space).await?;
            return Ok(RoomJoinOutcome::Joined {
                room: room_name.to_string(),
            });
        }

        let is_customer = space
            .participants
            .get(id)
            .is_some_and(|p| p.identity == Identity::Customer);

        let outcome = if is_customer {
            Self::enter_as_customer(&mut space, room_name, id)
        } else {
            Self::enter_as_assistant(&mut space, room_name, id)
        };

        if let RoomJoinOutcome::Joined { room } = &outcome {
            self.store.put_space(&space).await?;
            info!(
                target: "sc.managers.rooms",
                space = %space_name,
                requested = %room_name,
                joined = %room,
                participant_id = %id,
                "Pairing join"
            );
        }

        Ok(outcome)
    }

    fn enter_as_assistant(space: &mut Space, room_name: &str, id: &str) -> RoomJoinOutcome {
        if let Some(room) = space.room_mut(room_name) {
            if room.owner_id == id {
                if room.occupancy() >= 1 {
                    // Evict a leftover customer from the previous pairing
                    room.participants = vec![id.to_string()];
                    room.private = true;
                } else {
                    room.add(id);
                }
            } else {
                // Someone else's room; the assistant still enters what it
                // asked for
                room.add(id);
            }
        } else {
            let mut room = ChildRoom::new(room_name, id, true);
            room.add(id);
            space.rooms.push(room);
        }

        RoomJoinOutcome::Joined {
            room: room_name.to_string(),
        }
    }

    fn enter_as_customer(space: &mut Space, room_name: &str, id: &str) -> RoomJoinOutcome {
        let Some(target_owner) = space.room(room_name).map(|r| r.owner_id.clone()) else {
            return RoomJoinOutcome::WaitRoomNotReady;
        };

        if let Some(room) = space.room_mut(room_name) {
            if room.occupancy() < 2 {
                room.add(id);
                return RoomJoinOutcome::Joined {
                    room: room_name.to_string(),
                };
            }
        }

        // Target is full: look for an idle private room held open by a
        // different assistant
        let redirect = space
            .rooms
            .iter_mut()
            .find(|r| r.private && r.occupancy() == 1 && r.owner_id != target_owner);

        match redirect {
            Some(room) => {
                room.add(id);
                RoomJoinOutcome::Joined {
                    room: room.name.clone(),
                }
            }
            None => RoomJoinOutcome::WaitRoomFull,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::Participant;
    use chrono::Utc;

    fn space_with_participants(ids: &[(&str, Identity)]) -> Space {
        let now = Utc::now();
        let mut space = Space::new("demo", ids.first().map_or("none", |(id, _)| *id), now);
        for (id, identity) in ids {
            let mut p = Participant::new(id, now);
            p.identity = *identity;
            space.participants.insert((*id).to_string(), p);
        }
        space
    }

    #[test]
    fn test_assistant_reset_evicts_leftover_customer() {
        let mut space = space_with_participants(&[
            ("asst", Identity::Owner),
            ("cust", Identity::Customer),
        ]);
        let mut room = ChildRoom::new("Help", "asst", false);
        room.add("cust");
        space.rooms.push(room);

        let outcome = RoomAllocator::enter_as_assistant(&mut space, "Help", "asst");

        assert_eq!(
            outcome,
            RoomJoinOutcome::Joined {
                room: "Help".to_string()
            }
        );
        let room = space.room("Help").unwrap();
        assert_eq!(room.participants, vec!["asst".to_string()]);
        assert!(room.private, "reset forces privacy");
    }

    #[test]
    fn test_assistant_creates_missing_room() {
        let mut space = space_with_participants(&[("asst", Identity::Manager)]);

        let outcome = RoomAllocator::enter_as_assistant(&mut space, "Help", "asst");

        assert_eq!(
            outcome,
            RoomJoinOutcome::Joined {
                room: "Help".to_string()
            }
        );
        let room = space.room("Help").unwrap();
        assert!(room.private);
        assert_eq!(room.owner_id, "asst");
        assert_eq!(room.participants, vec!["asst".to_string()]);
    }

    #[test]
    fn test_customer_waits_for_missing_room() {
        let mut space = space_with_participants(&[("cust", Identity::Customer)]);

        let outcome = RoomAllocator::enter_as_customer(&mut space, "Help", "cust");

        assert_eq!(outcome, RoomJoinOutcome::WaitRoomNotReady);
        assert!(space.rooms.is_empty(), "wait outcome must not mutate");
    }

    #[test]
    fn test_customer_redirected_to_idle_room_of_other_assistant() {
        let mut space = space_with_participants(&[
            ("asst-a", Identity::Manager),
            ("asst-b", Identity::Manager),
            ("c1", Identity::Customer),
            ("c2", Identity::Customer),
        ]);

        let mut full = ChildRoom::new("Help", "asst-a", true);
        full.add("asst-a");
        full.add("c1");
        space.rooms.push(full);

        let mut idle = ChildRoom::new("Help2", "asst-b", true);
        idle.add("asst-b");
        space.rooms.push(idle);

        let outcome = RoomAllocator::enter_as_customer(&mut space, "Help", "c2");

        assert_eq!(
            outcome,
            RoomJoinOutcome::Joined {
                room: "Help2".to_string()
            }
        );
        assert!(space.room("Help2").unwrap().contains("c2"));
    }

    #[test]
    fn test_customer_not_redirected_to_same_assistants_room() {
        let mut space = space_with_participants(&[
            ("asst-a", Identity::Manager),
            ("c1", Identity::Customer),
            ("c2", Identity::Customer),
        ]);

        let mut full = ChildRoom::new("Help", "asst-a", true);
        full.add("asst-a");
        full.add("c1");
        space.rooms.push(full);

        // Idle room owned by the SAME assistant must not receive the redirect
        let mut idle = ChildRoom::new("Side", "asst-a", true);
        idle.add("asst-a");
        space.rooms.push(idle);

        let outcome = RoomAllocator::enter_as_customer(&mut space, "Help", "c2");

        assert_eq!(outcome, RoomJoinOutcome::WaitRoomFull);
    }

    #[test]
    fn test_customer_ignores_public_and_crowded_rooms_when_full() {
        let mut space = space_with_participants(&[
            ("asst-a", Identity::Manager),
            ("asst-b", Identity::Manager),
            ("c1", Identity::Customer),
            ("c2", Identity::Customer),
        ]);

        let mut full = ChildRoom::new("Help", "asst-a", true);
        full.add("asst-a");
        full.add("c1");
        space.rooms.push(full);

        // Public room: excluded even with one occupant
        let mut lounge = ChildRoom::new("Lounge", "asst-b", false);
        lounge.add("asst-b");
        space.rooms.push(lounge);

        let outcome = RoomAllocator::enter_as_customer(&mut space, "Help", "c2");

        assert_eq!(outcome, RoomJoinOutcome::WaitRoomFull);
    }
}
