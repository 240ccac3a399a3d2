//! Session state container.
//!
//! Holds the in-memory credential triple and mirrors every change into the
//! persistent store. The container is an explicit object handed to whoever
//! needs it; there is no process-wide instance.

use std::sync::Arc;

use tokio::sync::watch;

use super::claims::Claims;
use super::credential::SessionCredential;
use super::storage::{SESSION_KEYS, SessionStorage, StorageOp, TOKEN_KEY, USER_ID_KEY, USER_KEY};
use crate::error::Result;

/// What [`SessionState::restore`] found in the persistent store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// No session keys were present.
    Empty,
    /// A complete, consistent triple was loaded.
    Restored,
    /// Persisted data was unusable and has been removed.
    Discarded { reason: String },
}

/// In-memory credential triple backed by a persistent store.
///
/// Reads are synchronous snapshots. Mutations write the store first and only
/// then update memory, so a failed write leaves both sides as they were.
pub struct SessionState {
    storage: Arc<dyn SessionStorage>,
    credential: watch::Sender<SessionCredential>,
}

impl SessionState {
    /// Creates an anonymous container without reading the store.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (credential, _) = watch::channel(SessionCredential::Anonymous);
        Self {
            storage,
            credential,
        }
    }

    /// Creates a container initialized from whatever the store holds.
    ///
    /// An unreadable store, a corrupted `user` blob, a partial triple or a
    /// `userId` that does not match the claims subject is discarded: the
    /// three keys are removed and the container starts anonymous.
    ///
    /// # Errors
    ///
    /// Read failures of the store, other than an unparsable document, are
    /// returned.
    pub fn restore(storage: Arc<dyn SessionStorage>) -> Result<(Self, RestoreOutcome)> {
        let state = Self::new(storage);
        let persisted = match state.load_persisted() {
            Err(e) if e.is_serialization() => Err(format!("unreadable session store: {e}")),
            other => other?,
        };
        let outcome = match persisted {
            Ok(Some(credential)) => {
                tracing::info!(
                    "[SessionState] Restored session for user {}",
                    credential.user_id().unwrap_or_default()
                );
                state.credential.send_replace(credential);
                RestoreOutcome::Restored
            }
            Ok(None) => RestoreOutcome::Empty,
            Err(reason) => {
                tracing::warn!("[SessionState] Discarding persisted session: {}", reason);
                let removals: Vec<StorageOp> =
                    SESSION_KEYS.iter().map(|key| StorageOp::remove(*key)).collect();
                if let Err(e) = state.storage.write_batch(&removals) {
                    tracing::warn!(
                        "[SessionState] Failed to remove discarded session keys: {}",
                        e
                    );
                }
                RestoreOutcome::Discarded { reason }
            }
        };
        Ok((state, outcome))
    }

    /// Reads the persisted triple. The inner `Err` carries the reason the
    /// persisted data cannot be used.
    fn load_persisted(&self) -> Result<std::result::Result<Option<SessionCredential>, String>> {
        let token = self.storage.get_item(TOKEN_KEY)?;
        let user = self.storage.get_item(USER_KEY)?;
        let user_id = self.storage.get_item(USER_ID_KEY)?;

        let (token, user, user_id) = match (token, user, user_id) {
            (None, None, None) => return Ok(Ok(None)),
            (Some(token), Some(user), Some(user_id)) => (token, user, user_id),
            _ => return Ok(Err("partial session triple in storage".to_string())),
        };

        let claims = match Claims::from_json(&user) {
            Ok(claims) => claims,
            Err(e) => return Ok(Err(format!("unreadable user claims: {e}"))),
        };
        if claims.subject() != user_id {
            return Ok(Err(format!(
                "userId '{}' does not match claims subject '{}'",
                user_id,
                claims.subject()
            )));
        }

        Ok(SessionCredential::authenticated(token, claims)
            .map(Some)
            .map_err(|e| e.to_string()))
    }

    /// Returns a snapshot of the current triple.
    pub fn current(&self) -> SessionCredential {
        self.credential.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.borrow().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.credential.borrow().token().map(str::to_string)
    }

    /// Owner key for domain resources created on behalf of the user.
    pub fn user_id(&self) -> Option<String> {
        self.credential.borrow().user_id().map(str::to_string)
    }

    /// Receives a notification after each applied change.
    pub fn subscribe(&self) -> watch::Receiver<SessionCredential> {
        self.credential.subscribe()
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Stores `{token, claims, userId = claims.sub}` in memory and in the store.
    ///
    /// # Errors
    ///
    /// Returns [`FitgateError::Precondition`](crate::FitgateError::Precondition)
    /// for an empty token or subject, and storage errors when the write fails.
    /// In both cases nothing changes.
    pub fn commit(&self, token: &str, claims: Claims) -> Result<()> {
        let credential = SessionCredential::authenticated(token, claims)?;
        let ops = match &credential {
            SessionCredential::Authenticated { token, claims } => vec![
                StorageOp::set(TOKEN_KEY, token.as_str()),
                StorageOp::set(USER_KEY, claims.to_json()?),
                StorageOp::set(USER_ID_KEY, claims.subject()),
            ],
            SessionCredential::Anonymous => Vec::new(),
        };
        self.storage.write_batch(&ops)?;

        tracing::debug!(
            "[SessionState] Committed credentials for user {}",
            credential.user_id().unwrap_or_default()
        );
        self.credential.send_if_modified(|current| {
            if *current == credential {
                false
            } else {
                *current = credential;
                true
            }
        });
        Ok(())
    }

    /// Resets the triple to all-absent in memory and in the store.
    ///
    /// Memory is reset even when the store cannot be written, so a session is
    /// never left half torn down; the store error is still returned. Calling
    /// it on an anonymous container still removes the keys but does not
    /// notify subscribers.
    pub fn clear(&self) -> Result<()> {
        let removals: Vec<StorageOp> =
            SESSION_KEYS.iter().map(|key| StorageOp::remove(*key)).collect();
        let written = self.storage.write_batch(&removals);

        self.credential.send_if_modified(|current| {
            if current.is_authenticated() {
                tracing::debug!("[SessionState] Cleared credentials");
                *current = SessionCredential::Anonymous;
                true
            } else {
                false
            }
        });
        written
    }
}
