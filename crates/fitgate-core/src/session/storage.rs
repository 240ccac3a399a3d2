//! Persistent session store contract.

use crate::error::Result;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Key holding the JSON-serialized claims.
pub const USER_KEY: &str = "user";
/// Key holding the user identifier (claims subject).
pub const USER_ID_KEY: &str = "userId";

/// The three keys owned by the session state, in write order.
pub const SESSION_KEYS: [&str; 3] = [TOKEN_KEY, USER_KEY, USER_ID_KEY];

/// A single mutation against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl StorageOp {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self::Remove { key: key.into() }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// Durable string key/value storage that survives process restarts.
///
/// The store is shared: anything holding the handle may read or write it.
/// Session keys are written by [`SessionState`](super::SessionState) only.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes a key. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Applies several mutations as one unit.
    ///
    /// The default applies them one after another; implementations backed
    /// by a single file should override this to write once.
    fn write_batch(&self, ops: &[StorageOp]) -> Result<()> {
        for op in ops {
            match op {
                StorageOp::Set { key, value } => self.set_item(key, value)?,
                StorageOp::Remove { key } => self.remove_item(key)?,
            }
        }
        Ok(())
    }
}
