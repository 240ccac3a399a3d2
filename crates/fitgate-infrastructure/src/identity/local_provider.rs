//! Local identity adapter.
//!
//! Stands in for the browser PKCE library when the engine runs as a
//! standalone process. The redirect/code-exchange dance is not performed
//! here: `log_in` only announces the authorization target, and the token
//! obtained from the provider is handed back through [`complete_login`].
//!
//! [`complete_login`]: LocalIdentityProvider::complete_login

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use fitgate_core::config::IdentityConfig;
use fitgate_core::error::Result;
use fitgate_core::identity::{IdentityProvider, IdentitySignal};
use fitgate_core::session::{Claims, SessionStorage};
use serde_json::Value;
use tokio::sync::watch;

use super::jwt::decode_claims;

/// Store key under which the adapter keeps its own copy of the token,
/// separate from the session keys owned by the application.
pub const IDENTITY_TOKEN_KEY: &str = "identity.token";

pub struct LocalIdentityProvider {
    config: IdentityConfig,
    storage: Option<Arc<dyn SessionStorage>>,
    signal: watch::Sender<IdentitySignal>,
    login_pending: AtomicBool,
}

impl LocalIdentityProvider {
    /// A signed-out adapter that keeps nothing across restarts.
    pub fn new(config: IdentityConfig) -> Self {
        let (signal, _) = watch::channel(IdentitySignal::signed_out());
        Self {
            config,
            storage: None,
            signal,
            login_pending: AtomicBool::new(false),
        }
    }

    /// An adapter that remembers its token in `storage`, the way the browser
    /// library keeps its own entry in local storage.
    ///
    /// A remembered token that no longer decodes is dropped.
    pub fn with_storage(config: IdentityConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let mut provider = Self::new(config);
        if let Some(token) = storage.get_item(IDENTITY_TOKEN_KEY)? {
            match decode_claims(&token) {
                Ok(claims) => {
                    provider
                        .signal
                        .send_replace(IdentitySignal::signed_in(token, claims));
                }
                Err(e) => {
                    tracing::warn!("[Identity] Dropping undecodable remembered token: {}", e);
                    storage.remove_item(IDENTITY_TOKEN_KEY)?;
                }
            }
        }
        provider.storage = Some(storage);
        Ok(provider)
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Whether `log_in` ran without a matching `complete_login`.
    pub fn is_login_pending(&self) -> bool {
        self.login_pending.load(Ordering::SeqCst)
    }

    /// Finishes a login with the token returned by the provider.
    ///
    /// Claims are decoded from the token payload but not validated; checking
    /// them is the session engine's job.
    pub fn complete_login(&self, token: &str) -> Result<()> {
        let claims = decode_claims(token)?;
        self.complete_login_with_claims(token, claims)
    }

    /// Finishes a login with claims decoded elsewhere.
    ///
    /// The token is only remembered when its claims name a subject; others
    /// are still reported, but not replayed after a restart.
    pub fn complete_login_with_claims(&self, token: &str, claims: Value) -> Result<()> {
        if let Some(storage) = &self.storage {
            match Claims::from_value(&claims) {
                Ok(_) => storage.set_item(IDENTITY_TOKEN_KEY, token)?,
                Err(e) => {
                    tracing::warn!("[Identity] Not remembering token: {}", e);
                    storage.remove_item(IDENTITY_TOKEN_KEY)?;
                }
            }
        }
        self.login_pending.store(false, Ordering::SeqCst);
        tracing::info!("[Identity] Login completed");
        self.signal
            .send_replace(IdentitySignal::signed_in(token, claims));
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn current(&self) -> IdentitySignal {
        self.signal.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<IdentitySignal> {
        self.signal.subscribe()
    }

    async fn log_in(&self) -> Result<()> {
        if self.login_pending.swap(true, Ordering::SeqCst) {
            tracing::debug!("[Identity] Login already pending, redirecting again");
        }
        tracing::info!(
            authorization_endpoint = %self.config.authorization_endpoint,
            client_id = %self.config.client_id,
            redirect_uri = %self.config.redirect_uri,
            scope = %self.config.scope,
            "[Identity] Redirecting to identity provider"
        );
        Ok(())
    }

    async fn log_out(&self) -> Result<()> {
        if let Some(storage) = &self.storage {
            storage.remove_item(IDENTITY_TOKEN_KEY)?;
        }
        self.login_pending.store(false, Ordering::SeqCst);
        self.signal.send_if_modified(|current| {
            if current.has_token() {
                *current = IdentitySignal::signed_out();
                true
            } else {
                false
            }
        });
        tracing::info!("[Identity] Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::jwt::encode_unsigned;
    use crate::storage::MemorySessionStorage;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_flow_emits_signals() {
        let provider = LocalIdentityProvider::new(IdentityConfig::default());
        let mut rx = provider.subscribe();
        assert!(!provider.current().has_token());

        provider.log_in().await.unwrap();
        assert!(provider.is_login_pending());
        assert!(!rx.has_changed().unwrap());

        let token = encode_unsigned(&json!({ "sub": "u1" })).unwrap();
        provider.complete_login(&token).unwrap();
        assert!(!provider.is_login_pending());
        assert!(rx.has_changed().unwrap());
        let signal = rx.borrow_and_update().clone();
        assert_eq!(signal.token(), Some(token.as_str()));
        assert_eq!(signal.claims.unwrap()["sub"], "u1");

        provider.log_out().await.unwrap();
        assert!(!rx.borrow_and_update().has_token());
    }

    #[tokio::test]
    async fn test_remembered_token_survives_restart() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemorySessionStorage::new());
        let token = encode_unsigned(&json!({ "sub": "u9" })).unwrap();

        let first =
            LocalIdentityProvider::with_storage(IdentityConfig::default(), storage.clone()).unwrap();
        first.complete_login(&token).unwrap();

        let second =
            LocalIdentityProvider::with_storage(IdentityConfig::default(), storage.clone()).unwrap();
        assert_eq!(second.current().token(), Some(token.as_str()));

        second.log_out().await.unwrap();
        assert!(storage.get_item(IDENTITY_TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_undecodable_remembered_token_is_dropped() {
        let storage = Arc::new(MemorySessionStorage::with_items([(IDENTITY_TOKEN_KEY, "opaque")]));
        let provider =
            LocalIdentityProvider::with_storage(IdentityConfig::default(), storage.clone()).unwrap();

        assert!(!provider.current().has_token());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_complete_login_rejects_opaque_token() {
        let provider = LocalIdentityProvider::new(IdentityConfig::default());
        assert!(provider.complete_login("not-a-jwt").is_err());
        assert!(!provider.current().has_token());
    }

    #[test]
    fn test_token_without_subject_is_not_remembered() {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemorySessionStorage::new());
        let provider =
            LocalIdentityProvider::with_storage(IdentityConfig::default(), storage.clone()).unwrap();

        provider
            .complete_login_with_claims("abc", json!({ "email": "a@b.c" }))
            .unwrap();
        assert_eq!(provider.current().token(), Some("abc"));
        assert!(storage.get_item(IDENTITY_TOKEN_KEY).unwrap().is_none());

        let restarted =
            LocalIdentityProvider::with_storage(IdentityConfig::default(), storage).unwrap();
        assert!(!restarted.current().has_token());
    }
}
