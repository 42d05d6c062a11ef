//! Usage-time ledger.
//!
//! Persisted under its own key (`usage:{space}`) with its own index, so the
//! history survives deletion of the live space record. Every window with no
//! `end` corresponds to a currently-active participant or space.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One `{start, end}` window. An open window has `end = None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub start: DateTime<Utc>,

    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl UsageWindow {
    #[must_use]
    pub fn open(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Per-space usage record: space-level windows plus per-participant-name
/// windows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Windows during which the space itself was live.
    #[serde(default)]
    pub windows: Vec<UsageWindow>,

    /// Windows per participant display name.
    #[serde(default)]
    pub participants: HashMap<String, Vec<UsageWindow>>,
}

impl UsageRecord {
    /// Open a space-level window unless one is already open.
    pub fn open_space_window(&mut self, at: DateTime<Utc>) {
        if !self.windows.iter().any(UsageWindow::is_open) {
            self.windows.push(UsageWindow::open(at));
        }
    }

    /// Close the open space-level window, if any. Idempotent.
    pub fn close_space_window(&mut self, at: DateTime<Utc>) {
        for window in &mut self.windows {
            if window.is_open() {
                window.end = Some(at);
            }
        }
    }

    /// Open a window for a participant name unless one is already open.
    pub fn open_participant_window(&mut self, name: &str, at: DateTime<Utc>) {
        let windows = self.participants.entry(name.to_string()).or_default();
        if !windows.iter().any(UsageWindow::is_open) {
            windows.push(UsageWindow::open(at));
        }
    }

    /// Close the open window for a participant name, if any. Idempotent.
    pub fn close_participant_window(&mut self, name: &str, at: DateTime<Utc>) {
        if let Some(windows) = self.participants.get_mut(name) {
            for window in windows {
                if window.is_open() {
                    window.end = Some(at);
                }
            }
        }
    }

    /// Close every open window, space-level and per-participant.
    pub fn close_all(&mut self, at: DateTime<Utc>) {
        self.close_space_window(at);
        let names: Vec<String> = self.participants.keys().cloned().collect();
        for name in names {
            self.close_participant_window(&name, at);
        }
    }
}
