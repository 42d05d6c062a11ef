//! Event bus fake that records emitted signals.

use async_trait::async_trait;
use space_controller::errors::ScError;
use space_controller::events::EventBus;
use std::sync::{Arc, Mutex};

/// Records every re-init signal as a `(space, participant_id)` pair.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventBus {
    signals: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// All signals emitted so far, in order.
    pub fn emitted(&self) -> Vec<(String, String)> {
        self.signals.lock().unwrap().clone()
    }

    /// Count of re-init signals for one participant in one space.
    pub fn count_for(&self, space: &str, participant_id: &str) -> usize {
        self.signals
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, p)| s == space && p == participant_id)
            .count()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn emit_re_init(&self, space: &str, participant_id: &str) -> Result<(), ScError> {
        self.signals
            .lock()
            .unwrap()
            .push((space.to_string(), participant_id.to_string()));
        Ok(())
    }
}
