//! Pre-configured test data.

use chrono::Utc;
use space_controller::models::{Identity, Participant, Space};

/// Build a participant with the given identity, online.
pub fn participant_with_identity(id: &str, identity: Identity) -> Participant {
    let mut participant = Participant::new(id, Utc::now());
    participant.identity = identity;
    participant.online = true;
    participant
}

/// Build a space owned by the first listed participant.
///
/// The first `(id, identity)` pair becomes `owner_id`; identities are
/// stored as given (callers exercising the normalizer can pass
/// inconsistent ones on purpose).
pub fn space_with_participants(name: &str, members: &[(&str, Identity)]) -> Space {
    let owner_id = members.first().map(|(id, _)| *id).unwrap_or("owner");
    let mut space = Space::new(name, owner_id, Utc::now());
    for (id, identity) in members {
        space
            .participants
            .insert((*id).to_string(), participant_with_identity(id, *identity));
    }
    space
}
