//! Reconciliation background task.
//!
//! Periodically diffs the session store against the authoritative
//! participant roster reported by the media backend and repairs drift both
//! ways:
//!
//! - store-only participants of non-persistent spaces (dropped connection
//!   without a clean leave) are removed through the normal participant
//!   lifecycle path, so ownership-transfer and cleanup rules apply;
//! - roster-only participants (join write failed or raced) get a re-init
//!   signal over the event bus; the store is never mutated directly, so
//!   population always goes through the normal join path.
//!
//! A failure against the media backend aborts only the affected scope: a
//! failed room listing ends that sweep, a failed roster fetch skips that
//! space. Nothing is retried inside a sweep; the next tick tries again.
//!
//! # Graceful Shutdown
//!
//! The task supports graceful shutdown via a cancellation token. When the
//! token is cancelled, the task completes its current iteration and exits
//! cleanly.

use crate::errors::ScError;
use crate::events::EventBus;
use crate::managers::ParticipantManager;
use crate::media::MediaBackend;
use crate::observability::metrics;
use crate::store::SessionStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Default sweep interval in seconds.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 30;

/// Default per-space deadline in seconds. Bounds one hung backend call so
/// it cannot stall the remainder of the sweep.
pub const DEFAULT_SPACE_DEADLINE_SECONDS: u64 = 10;

/// Configuration for the reconciliation task.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Sweep interval in seconds.
    pub interval_seconds: u64,
    /// Deadline for one space's reconciliation in seconds.
    pub space_deadline_seconds: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            space_deadline_seconds: DEFAULT_SPACE_DEADLINE_SECONDS,
        }
    }
}

/// The reconciliation worker. Holds the same injected collaborators as the
/// request path and drives removals through the same manager.
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn SessionStore>,
    media: Arc<dyn MediaBackend>,
    events: Arc<dyn EventBus>,
    participants: ParticipantManager,
    config: ReconcilerConfig,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        media: Arc<dyn MediaBackend>,
        events: Arc<dyn EventBus>,
        participants: ParticipantManager,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            media,
            events,
            participants,
            config,
        }
    }

    /// Run one full sweep over every room the media backend knows.
    ///
    /// Never returns an error: failures are logged and counted, and the
    /// next tick gets a fresh start.
    #[instrument(skip_all)]
    pub async fn sweep(&self) {
        metrics::incr_reconciler_sweeps();

        let rooms = match self.media.list_rooms().await {
            Ok(rooms) => rooms,
            Err(e) => {
                // Abort only this sweep; the loop proceeds to the next tick
                warn!(
                    target: "sc.task.reconciler",
                    error = %e,
                    "Failed to list rooms; aborting sweep"
                );
                metrics::incr_reconciler_failures("list_rooms");
                return;
            }
        };

        let deadline = Duration::from_secs(self.config.space_deadline_seconds);

        for room in rooms {
            match tokio::time::timeout(deadline, self.reconcile_space(&room.name)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    // One space's failure must not block the others
                    warn!(
                        target: "sc.task.reconciler",
                        space = %room.name,
                        error = %e,
                        "Failed to reconcile space"
                    );
                    metrics::incr_reconciler_failures("space");
                }
                Err(_) => {
                    warn!(
                        target: "sc.task.reconciler",
                        space = %room.name,
                        deadline_seconds = self.config.space_deadline_seconds,
                        "Space reconciliation exceeded deadline"
                    );
                    metrics::incr_reconciler_failures("deadline");
                }
            }
        }
    }

    /// Reconcile one space against the backend roster.
    #[instrument(skip(self), fields(space = %space_name))]
    pub async fn reconcile_space(&self, space_name: &str) -> Result<(), ScError> {
        let roster = self.media.list_participants(space_name).await?;

        let Some(space) = self.store.get_space(space_name).await? else {
            // The backend can know rooms this store does not (environment
            // mismatch); tolerated, not an error
            debug!(
                target: "sc.task.reconciler",
                space = %space_name,
                "Room known to media backend but absent from store; skipping"
            );
            return Ok(());
        };

        let roster_ids: HashSet<String> = roster.into_iter().map(|p| p.identity).collect();
        let store_ids: HashSet<String> = space.participants.keys().cloned().collect();

        // Store believes present, backend disagrees: stale records from a
        // dropped connection. Persistent spaces keep offline participants by
        // design, so the cleanup half is skipped there entirely.
        if !space.persistent {
            for id in store_ids.difference(&roster_ids) {
                match self.participants.remove_participant(space_name, id).await {
                    Ok(outcome) => {
                        metrics::incr_reconciler_removals();
                        debug!(
                            target: "sc.task.reconciler",
                            space = %space_name,
                            participant_id = %id,
                            outcome = ?outcome,
                            "Removed participant absent from roster"
                        );
                    }
                    Err(ScError::NotFound(_)) => {
                        // Another writer got there first; converged anyway
                    }
                    Err(e) => {
                        warn!(
                            target: "sc.task.reconciler",
                            space = %space_name,
                            participant_id = %id,
                            error = %e,
                            "Failed to remove stale participant"
                        );
                    }
                }
            }
        }

        // Backend has a live participant the store never learned about: ask
        // the client to re-join. Never mutate the store directly - the join
        // path owns the invariants.
        for id in roster_ids.difference(&store_ids) {
            self.events.emit_re_init(space_name, id).await?;
            metrics::incr_reconciler_reinits();
            info!(
                target: "sc.task.reconciler",
                space = %space_name,
                participant_id = %id,
                "Requested re-init for participant missing from store"
            );
        }

        Ok(())
    }
}

/// Start the reconciliation background task.
///
/// Runs a sweep at every interval tick until the cancellation token fires.
#[instrument(skip_all, name = "sc.task.reconciler")]
pub async fn start_reconciler(reconciler: Reconciler, cancel_token: CancellationToken) {
    info!(
        target: "sc.task.reconciler",
        interval_seconds = reconciler.config.interval_seconds,
        space_deadline_seconds = reconciler.config.space_deadline_seconds,
        "Starting reconciler task"
    );

    let mut interval =
        tokio::time::interval(Duration::from_secs(reconciler.config.interval_seconds));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                reconciler.sweep().await;
            }
            () = cancel_token.cancelled() => {
                info!(
                    target: "sc.task.reconciler",
                    "Reconciler task received shutdown signal, exiting"
                );
                break;
            }
        }
    }

    info!(target: "sc.task.reconciler", "Reconciler task stopped");
}
