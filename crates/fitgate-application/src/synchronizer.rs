//! Session synchronizer.
//!
//! The only component that decides when credentials are committed. It
//! observes identity signals, reconciles the session state (and through it
//! the persistent store) and owns the session-ready flag.

use std::sync::Arc;

use fitgate_core::error::Result;
use fitgate_core::identity::{IdentityProvider, IdentitySignal};
use fitgate_core::session::{SessionCredential, SessionState};

/// Result of reconciling one identity signal against the current triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Triple the session state should hold afterwards.
    pub next: SessionCredential,
    /// Whether `next` must be committed.
    pub commit: bool,
    pub ready: bool,
}

/// Decides what a signal means for the session.
///
/// - token present: commit token and validated claims, session ready.
/// - token absent: keep the triple as is (only logout clears), not ready.
///
/// # Errors
///
/// A token reported with claims lacking a subject is rejected with
/// [`FitgateError::InvalidClaims`](fitgate_core::FitgateError::InvalidClaims).
pub fn reconcile(previous: &SessionCredential, signal: &IdentitySignal) -> Result<Reconciliation> {
    let Some(token) = signal.token() else {
        return Ok(Reconciliation {
            next: previous.clone(),
            commit: false,
            ready: false,
        });
    };

    let claims = signal.validated_claims()?;
    let next = SessionCredential::authenticated(token, claims)?;
    Ok(Reconciliation {
        next,
        commit: true,
        ready: true,
    })
}

/// What happened during logout. Local state is cleared regardless of the
/// provider outcome.
#[derive(Debug)]
pub struct LogoutReport {
    pub cleared: Result<()>,
    pub provider: Result<()>,
}

impl LogoutReport {
    pub fn is_clean(&self) -> bool {
        self.cleared.is_ok() && self.provider.is_ok()
    }
}

pub struct SessionSynchronizer {
    state: Arc<SessionState>,
    identity: Arc<dyn IdentityProvider>,
    ready: bool,
}

impl SessionSynchronizer {
    pub fn new(state: Arc<SessionState>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            state,
            identity,
            ready: false,
        }
    }

    pub fn state(&self) -> &Arc<SessionState> {
        &self.state
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Applies one signal and returns the new session-ready flag.
    ///
    /// On error nothing is committed and the session is not ready.
    pub fn apply(&mut self, signal: &IdentitySignal) -> Result<bool> {
        let previous = self.state.current();
        let outcome = reconcile(&previous, signal).and_then(|reconciliation| {
            if reconciliation.commit
                && let SessionCredential::Authenticated { token, claims } = &reconciliation.next
            {
                self.state.commit(token, claims.clone())?;
            }
            Ok(reconciliation)
        });

        match outcome {
            Ok(reconciliation) => {
                if reconciliation.ready != self.ready {
                    tracing::info!(
                        "[Synchronizer] Session ready: {} -> {} (user {})",
                        self.ready,
                        reconciliation.ready,
                        reconciliation.next.user_id().unwrap_or("-")
                    );
                }
                if previous.is_authenticated()
                    && reconciliation.commit
                    && previous.user_id() != reconciliation.next.user_id()
                {
                    tracing::info!(
                        "[Synchronizer] User switched from {} to {}",
                        previous.user_id().unwrap_or("-"),
                        reconciliation.next.user_id().unwrap_or("-")
                    );
                }
                self.ready = reconciliation.ready;
                Ok(self.ready)
            }
            Err(e) => {
                tracing::error!("[Synchronizer] Rejected identity signal: {}", e);
                self.ready = false;
                Err(e)
            }
        }
    }

    /// Applies whatever the identity provider currently reports.
    pub fn sync_current(&mut self) -> Result<bool> {
        let signal = self.identity.current();
        self.apply(&signal)
    }

    /// Clears the session and asks the provider to log out.
    ///
    /// Both steps always run; a failing provider does not restore the local
    /// session.
    pub async fn logout(&mut self) -> LogoutReport {
        let cleared = self.state.clear();
        if let Err(e) = &cleared {
            tracing::error!("[Synchronizer] Failed to clear session: {}", e);
        }
        self.ready = false;

        let provider = self.identity.log_out().await;
        if let Err(e) = &provider {
            tracing::warn!("[Synchronizer] Identity provider logout failed: {}", e);
        }

        LogoutReport { cleared, provider }
    }
}
