//! Identity context adapter contract.
//!
//! The OAuth2/PKCE flow lives in an external identity library. The engine
//! only observes the token and decoded claims it exposes, and calls its
//! login/logout triggers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{FitgateError, Result};
use crate::session::Claims;

/// Live token and claims as reported by the identity library.
///
/// Claims stay untyped here; they are validated into [`Claims`] when a
/// signal crosses into the session engine.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IdentitySignal {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub claims: Option<Value>,
}

impl IdentitySignal {
    /// A signal carrying no token.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>, claims: Value) -> Self {
        Self {
            token: Some(token.into()),
            claims: Some(claims),
        }
    }

    /// The token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Validates the raw claims.
    ///
    /// # Errors
    ///
    /// [`FitgateError::InvalidClaims`] when claims are absent or lack a subject.
    pub fn validated_claims(&self) -> Result<Claims> {
        let raw = self
            .claims
            .as_ref()
            .ok_or_else(|| FitgateError::invalid_claims("token reported without claims"))?;
        Claims::from_value(raw)
    }
}

/// The identity library as seen by the session engine.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current token and claims.
    fn current(&self) -> IdentitySignal;

    /// Receiver notified whenever the token or claims change.
    fn subscribe(&self) -> watch::Receiver<IdentitySignal>;

    /// Starts the external login redirect. Completion shows up later as a
    /// new signal, not as a return value.
    async fn log_in(&self) -> Result<()>;

    /// Tears down the provider-side session.
    async fn log_out(&self) -> Result<()>;
}
