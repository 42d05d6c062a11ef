//! Participant lifecycle integration tests.
//!
//! Exercises the upsert/remove/transfer paths against the in-memory store:
//! space auto-creation, the single-owner invariant, patch merge semantics,
//! RBAC room provisioning, persistence branching on leave, and ownership
//! transfer rules.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use sc_test_utils::MemoryStore;
use space_controller::errors::ScError;
use space_controller::managers::{ParticipantManager, RemovalOutcome, UsageLedger};
use space_controller::models::{Identity, ParticipantPatch, Platform};
use std::collections::HashMap;
use std::sync::Arc;

fn manager(store: &Arc<MemoryStore>) -> ParticipantManager {
    let usage = UsageLedger::new(store.clone());
    ParticipantManager::new(store.clone(), usage)
}

fn patch_with_identity(identity: Identity) -> ParticipantPatch {
    ParticipantPatch {
        identity: Some(identity),
        ..ParticipantPatch::default()
    }
}

#[tokio::test]
async fn test_first_joiner_becomes_owner_regardless_of_patch() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    // Patch claims guest; the first joiner of an empty space is forced owner
    let joined = participants
        .upsert_participant("atrium", "alice", &patch_with_identity(Identity::Guest), true)
        .await
        .unwrap();

    assert_eq!(joined.identity, Identity::Owner);
    assert!(joined.online);

    let space = store.space("atrium").unwrap();
    assert_eq!(space.owner_id, "alice");
}

#[tokio::test]
async fn test_exactly_one_owner_with_competing_claims() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "alice", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    // A later joiner claiming owner is demoted on write
    let bob = participants
        .upsert_participant("atrium", "bob", &patch_with_identity(Identity::Owner), true)
        .await
        .unwrap();

    assert_eq!(bob.identity, Identity::Participant);

    let space = store.space("atrium").unwrap();
    let owners: Vec<_> = space
        .participants
        .values()
        .filter(|p| p.identity == Identity::Owner)
        .collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners.first().unwrap().id, "alice");
}

#[tokio::test]
async fn test_upsert_merges_exactly_the_patch() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    let initial = ParticipantPatch {
        name: Some("Alice".to_string()),
        app_sync: Some(HashMap::from([("whiteboard".to_string(), true)])),
        hand_raised: Some(true),
        ..ParticipantPatch::default()
    };
    participants
        .upsert_participant("atrium", "alice", &initial, true)
        .await
        .unwrap();

    // Second upsert touches only session_id; everything else must survive
    let update = ParticipantPatch {
        session_id: Some("sess-42".to_string()),
        ..ParticipantPatch::default()
    };
    participants
        .upsert_participant("atrium", "alice", &update, false)
        .await
        .unwrap();

    let space = store.space("atrium").unwrap();
    let alice = space.participants.get("alice").unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.session_id.as_deref(), Some("sess-42"));
    assert_eq!(alice.app_sync.get("whiteboard"), Some(&true));
    assert!(alice.hand_raised);
}

#[tokio::test]
async fn test_initial_join_provisions_private_room_per_policy() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let space = store.space("atrium").unwrap();
    // Owner's policy auto-provisions a private room named after the display name
    let room = space.room("owner's Room").expect("room should exist");
    assert!(room.private);
    assert_eq!(room.owner_id, "owner");
    assert_eq!(room.occupancy(), 0);

    // Customers get no room
    participants
        .upsert_participant("atrium", "cust", &patch_with_identity(Identity::Customer), true)
        .await
        .unwrap();
    let space = store.space("atrium").unwrap();
    assert!(space.room("cust's Room").is_none());
}

#[tokio::test]
async fn test_room_provisioning_skipped_without_initial_join() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "mgr", &patch_with_identity(Identity::Manager), false)
        .await
        .unwrap();

    let space = store.space("atrium").unwrap();
    assert!(
        space.room("mgr's Room").is_none(),
        "policy only runs on initial join"
    );
}

#[tokio::test]
async fn test_upsert_opens_usage_windows() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant(
            "atrium",
            "alice",
            &ParticipantPatch {
                name: Some("Alice".to_string()),
                ..ParticipantPatch::default()
            },
            true,
        )
        .await
        .unwrap();

    let usage = store.usage("atrium").expect("ledger entry should exist");
    assert_eq!(usage.windows.iter().filter(|w| w.is_open()).count(), 1);
    let alice_windows = usage.participants.get("Alice").unwrap();
    assert_eq!(alice_windows.iter().filter(|w| w.is_open()).count(), 1);
}

#[tokio::test]
async fn test_owner_leave_transfers_ownership_in_non_persistent_space() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "p1", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "p2", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let outcome = participants
        .remove_participant("atrium", "owner")
        .await
        .unwrap();
    assert_eq!(outcome, RemovalOutcome::Removed);

    let space = store.space("atrium").unwrap();
    // Record deleted, ownership moved to one of the remaining participants
    assert!(!space.participants.contains_key("owner"));
    assert!(space.owner_id == "p1" || space.owner_id == "p2");
    // No stale owner auth: exactly one owner identity, on the new owner_id
    let owners: Vec<_> = space
        .participants
        .values()
        .filter(|p| p.identity == Identity::Owner)
        .collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners.first().unwrap().id, space.owner_id);
}

#[tokio::test]
async fn test_last_leave_deletes_space_and_closes_usage() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "alice", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let outcome = participants
        .remove_participant("atrium", "alice")
        .await
        .unwrap();
    assert_eq!(outcome, RemovalOutcome::SpaceCleared);

    assert!(store.space("atrium").is_none());
    let usage = store.usage("atrium").expect("history must survive deletion");
    assert!(usage.windows.iter().all(|w| !w.is_open()));
    assert!(usage.participants.values().flatten().all(|w| !w.is_open()));
}

#[tokio::test]
async fn test_persistent_space_keeps_offline_participants() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "bob", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let mut space = store.space("atrium").unwrap();
    space.persistent = true;
    store.insert_space(space);

    participants
        .remove_participant("atrium", "bob")
        .await
        .unwrap();

    let space = store.space("atrium").unwrap();
    let bob = space.participants.get("bob").expect("record retained");
    assert!(!bob.online);
}

#[tokio::test]
async fn test_persistent_space_deletes_guests_outright() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "guest", &patch_with_identity(Identity::Guest), true)
        .await
        .unwrap();

    let mut space = store.space("atrium").unwrap();
    space.persistent = true;
    store.insert_space(space);

    participants
        .remove_participant("atrium", "guest")
        .await
        .unwrap();

    let space = store.space("atrium").unwrap();
    assert!(!space.participants.contains_key("guest"));
}

#[tokio::test]
async fn test_remove_unknown_participant_is_typed_not_found() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "alice", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let err = participants
        .remove_participant("atrium", "nobody")
        .await
        .unwrap_err();
    assert!(matches!(err, ScError::NotFound(_)));

    let err = participants
        .remove_participant("void", "alice")
        .await
        .unwrap_err();
    assert!(matches!(err, ScError::NotFound(_)));
}

#[tokio::test]
async fn test_transfer_owner_downgrades_by_platform() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant(
            "atrium",
            "owner",
            &ParticipantPatch {
                platform: Some(Platform::Portal),
                ..ParticipantPatch::default()
            },
            true,
        )
        .await
        .unwrap();
    participants
        .upsert_participant("atrium", "next", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let transferred = participants.transfer_owner("atrium", "next").await.unwrap();
    assert!(transferred);

    let space = store.space("atrium").unwrap();
    assert_eq!(space.owner_id, "next");
    assert_eq!(
        space.participants.get("next").unwrap().identity,
        Identity::Owner
    );
    // Portal is the service platform: displaced owner becomes a customer
    assert_eq!(
        space.participants.get("owner").unwrap().identity,
        Identity::Customer
    );
}

#[tokio::test]
async fn test_transfer_owner_missing_id_has_no_side_effects() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();

    let before = store.space("atrium").unwrap();
    let transferred = participants
        .transfer_owner("atrium", "nobody")
        .await
        .unwrap();
    assert!(!transferred);

    let after = store.space("atrium").unwrap();
    assert_eq!(after.owner_id, before.owner_id);
    assert_eq!(after.participants.len(), before.participants.len());
}

#[tokio::test]
async fn test_manager_roster_derived_and_capped() {
    let store = MemoryStore::shared();
    let participants = manager(&store);

    participants
        .upsert_participant("atrium", "owner", &ParticipantPatch::default(), true)
        .await
        .unwrap();
    for i in 0..6 {
        participants
            .upsert_participant(
                "atrium",
                &format!("mgr-{i}"),
                &patch_with_identity(Identity::Manager),
                true,
            )
            .await
            .unwrap();
    }

    let space = store.space("atrium").unwrap();
    assert_eq!(space.managers.len(), 5, "roster capped at five");
    assert!(!space.managers.contains(&"owner".to_string()));
    // The overflow manager was demoted, not dropped
    let demoted = space
        .participants
        .values()
        .filter(|p| p.identity == Identity::Participant)
        .count();
    assert_eq!(demoted, 1);
}
