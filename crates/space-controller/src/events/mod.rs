//! Event bus for client-facing signals.
//!
//! The only signal this core emits is the re-initialization request: the
//! reconciler found a live participant the store never learned about and
//! asks the client to re-join through the normal path. A transport layer
//! outside this core consumes the channel and forwards to the client.

use crate::errors::ScError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, warn};

/// Pub/sub channel carrying re-init signals.
pub const RE_INIT_CHANNEL: &str = "sc:events:re_init";

/// Re-initialization request for one participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReInitSignal {
    /// Always `"re_init"`.
    pub event: String,
    pub participant_id: String,
    pub space: String,
}

impl ReInitSignal {
    #[must_use]
    pub fn new(space: &str, participant_id: &str) -> Self {
        Self {
            event: "re_init".to_string(),
            participant_id: participant_id.to_string(),
            space: space.to_string(),
        }
    }
}

/// Outbound event contract.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Ask a participant's client to re-join the space.
    async fn emit_re_init(&self, space: &str, participant_id: &str) -> Result<(), ScError>;
}

/// Event bus over Redis pub/sub.
#[derive(Clone)]
pub struct RedisEventBus {
    connection: MultiplexedConnection,
}

impl RedisEventBus {
    /// Connect to Redis for publishing.
    ///
    /// # Errors
    ///
    /// Returns `ScError::Store` if the connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, ScError> {
        let client = Client::open(redis_url).map_err(|e| {
            // Do NOT log redis_url, it may contain credentials
            error!(target: "sc.events", error = %e, "Failed to open Redis client");
            ScError::Store(format!("Failed to open Redis client: {e}"))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(target: "sc.events", error = %e, "Failed to connect to Redis");
                ScError::Store(format!("Failed to connect to Redis: {e}"))
            })?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    #[instrument(skip_all, fields(space = %space, participant_id = %participant_id))]
    async fn emit_re_init(&self, space: &str, participant_id: &str) -> Result<(), ScError> {
        let signal = ReInitSignal::new(space, participant_id);
        let payload = serde_json::to_string(&signal)
            .map_err(|e| ScError::Internal(format!("serialization failed: {e}")))?;

        let mut conn = self.connection.clone();
        let _: () = conn.publish(RE_INIT_CHANNEL, payload).await.map_err(|e| {
            warn!(
                target: "sc.events",
                space = %space,
                participant_id = %participant_id,
                error = %e,
                "Failed to publish re-init signal"
            );
            ScError::Store(format!("Failed to publish re-init signal: {e}"))
        })?;

        debug!(
            target: "sc.events",
            space = %space,
            participant_id = %participant_id,
            "Emitted re-init signal"
        );

        Ok(())
    }
}
