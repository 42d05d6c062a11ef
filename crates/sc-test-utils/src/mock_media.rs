//! Scripted media backend.
//!
//! Tests script which rooms exist and who is connected, and can toggle
//! failures globally or per room to exercise the reconciler's
//! failure-isolation behavior.

use async_trait::async_trait;
use space_controller::errors::ScError;
use space_controller::media::{MediaBackend, MediaParticipant, MediaRoom};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockMediaInner {
    rosters: HashMap<String, Vec<String>>,
    fail_list_rooms: bool,
    fail_rooms: HashSet<String>,
}

/// Scripted `MediaBackend` for tests. Rooms are derived from the scripted
/// rosters.
#[derive(Debug, Clone, Default)]
pub struct MockMediaBackend {
    inner: Arc<Mutex<MockMediaInner>>,
}

impl MockMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Script the connected roster for a room.
    pub fn with_roster(self, room: &str, identities: &[&str]) -> Self {
        self.set_roster(room, identities);
        self
    }

    /// Replace the roster for a room.
    pub fn set_roster(&self, room: &str, identities: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        inner.rosters.insert(
            room.to_string(),
            identities.iter().map(|s| (*s).to_string()).collect(),
        );
    }

    /// Make `list_rooms` fail until cleared.
    pub fn set_fail_list_rooms(&self, fail: bool) {
        self.inner.lock().unwrap().fail_list_rooms = fail;
    }

    /// Make `list_participants` fail for one room until cleared.
    pub fn set_fail_room(&self, room: &str, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        if fail {
            inner.fail_rooms.insert(room.to_string());
        } else {
            inner.fail_rooms.remove(room);
        }
    }
}

#[async_trait]
impl MediaBackend for MockMediaBackend {
    async fn list_rooms(&self) -> Result<Vec<MediaRoom>, ScError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_list_rooms {
            return Err(ScError::MediaBackend("scripted list_rooms failure".to_string()));
        }
        let mut names: Vec<String> = inner.rosters.keys().cloned().collect();
        names.sort();
        Ok(names.into_iter().map(|name| MediaRoom { name }).collect())
    }

    async fn list_participants(&self, space: &str) -> Result<Vec<MediaParticipant>, ScError> {
        let inner = self.inner.lock().unwrap();
        if inner.fail_rooms.contains(space) {
            return Err(ScError::MediaBackend(format!(
                "scripted roster failure for {space}"
            )));
        }
        Ok(inner
            .rosters
            .get(space)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|identity| MediaParticipant { identity })
            .collect())
    }
}
