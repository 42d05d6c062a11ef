//! Session store access layer.
//!
//! Contract for reading and writing one serialized [`Space`] record per key,
//! plus a name index, plus the independently-persisted usage ledger. The
//! trait seam exists so managers take `Arc<dyn SessionStore>` and tests
//! inject an in-memory fake.
//!
//! The store provides no cross-call transaction: callers follow a
//! read-modify-write discipline on the whole blob, and concurrent writers to
//! the same space race (last write wins).

mod redis;

pub use self::redis::RedisSessionStore;

use crate::errors::ScError;
use crate::models::{Space, UsageRecord};
use async_trait::async_trait;

/// Key patterns used by the store.
pub mod keys {
    /// Set holding all live space names.
    pub const SPACE_INDEX: &str = "space:index";

    /// Set holding all space names with usage history.
    pub const USAGE_INDEX: &str = "usage:index";

    #[must_use]
    pub fn space(name: &str) -> String {
        format!("space:{name}")
    }

    /// Chat history lives under this key, written by the chat transport
    /// outside this core. The store only cascade-deletes it.
    #[must_use]
    pub fn chat(name: &str) -> String {
        format!("chat:{name}")
    }

    #[must_use]
    pub fn usage(name: &str) -> String {
        format!("usage:{name}")
    }
}

/// Access contract for the shared session store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the space record for `name`, if present.
    async fn get_space(&self, name: &str) -> Result<Option<Space>, ScError>;

    /// Write the whole space blob and add the name to the index.
    async fn put_space(&self, space: &Space) -> Result<(), ScError>;

    /// Delete the live record, cascade the chat-history key, and drop the
    /// name from the index. The usage ledger is untouched.
    async fn remove_space(&self, name: &str) -> Result<(), ScError>;

    /// Whether a record exists for `name`.
    async fn space_exists(&self, name: &str) -> Result<bool, ScError>;

    /// All live space names (index members).
    async fn space_names(&self) -> Result<Vec<String>, ScError>;

    /// Fetch the usage ledger for a space id, if any history exists.
    async fn get_usage(&self, name: &str) -> Result<Option<UsageRecord>, ScError>;

    /// Write the usage ledger and index the space id.
    async fn put_usage(&self, name: &str, record: &UsageRecord) -> Result<(), ScError>;

    /// All space ids with usage history, including deleted spaces.
    async fn usage_names(&self) -> Result<Vec<String>, ScError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(keys::space("atrium"), "space:atrium");
        assert_eq!(keys::chat("atrium"), "chat:atrium");
        assert_eq!(keys::usage("atrium"), "usage:atrium");
        assert_eq!(keys::SPACE_INDEX, "space:index");
        assert_eq!(keys::USAGE_INDEX, "usage:index");
    }
}
