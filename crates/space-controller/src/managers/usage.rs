//! Usage-time ledger manager.
//!
//! Windows are persisted under `usage:{space}` with their own index, never
//! under the live space record, so billing history survives space deletion.
//! All window operations are idempotent: opening while open and closing
//! while closed are no-ops.

use crate::errors::ScError;
use crate::models::UsageRecord;
use crate::store::SessionStore;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::instrument;

/// Manager for the per-space usage ledger.
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<dyn SessionStore>,
}

impl UsageLedger {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    async fn update<F>(&self, space: &str, mutate: F) -> Result<(), ScError>
    where
        F: FnOnce(&mut UsageRecord),
    {
        let mut record = self.store.get_usage(space).await?.unwrap_or_default();
        mutate(&mut record);
        self.store.put_usage(space, &record).await
    }

    /// Open the space-level window (space came alive).
    #[instrument(skip_all, fields(space = %space))]
    pub async fn open_space_window(&self, space: &str) -> Result<(), ScError> {
        self.update(space, |r| r.open_space_window(Utc::now())).await
    }

    /// Close the space-level window (space deleted or emptied).
    #[instrument(skip_all, fields(space = %space))]
    pub async fn close_space_window(&self, space: &str) -> Result<(), ScError> {
        self.update(space, |r| r.close_space_window(Utc::now()))
            .await
    }

    /// Open a window for a participant display name.
    #[instrument(skip_all, fields(space = %space, participant = %name))]
    pub async fn open_participant_window(&self, space: &str, name: &str) -> Result<(), ScError> {
        self.update(space, |r| r.open_participant_window(name, Utc::now()))
            .await
    }

    /// Close a participant's open window.
    #[instrument(skip_all, fields(space = %space, participant = %name))]
    pub async fn close_participant_window(&self, space: &str, name: &str) -> Result<(), ScError> {
        self.update(space, |r| r.close_participant_window(name, Utc::now()))
            .await
    }

    /// Close every open window for a space (terminal closing entry on
    /// space deletion).
    #[instrument(skip_all, fields(space = %space))]
    pub async fn close_all(&self, space: &str) -> Result<(), ScError> {
        self.update(space, |r| r.close_all(Utc::now())).await
    }

    /// Ledger for one space id. Works for deleted spaces too.
    #[instrument(skip_all, fields(space = %space))]
    pub async fn for_space(&self, space: &str) -> Result<Option<UsageRecord>, ScError> {
        self.store.get_usage(space).await
    }

    /// Full ledger, keyed by space id.
    #[instrument(skip_all)]
    pub async fn all(&self) -> Result<HashMap<String, UsageRecord>, ScError> {
        let mut ledger = HashMap::new();
        for name in self.store.usage_names().await? {
            if let Some(record) = self.store.get_usage(&name).await? {
                ledger.insert(name, record);
            }
        }
        Ok(ledger)
    }
}
