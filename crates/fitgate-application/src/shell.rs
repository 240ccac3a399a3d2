//! Application shell.
//!
//! Ties the synchronizer to the route tree: every identity signal is
//! reconciled, the tree is rebuilt when session readiness flips, and the
//! current location is re-resolved against the new tree. Each of these
//! steps runs inside one `&mut self` call, so no caller observes a state
//! where the session and the tree disagree.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fitgate_core::error::Result;
use fitgate_core::identity::{IdentityProvider, IdentitySignal};
use fitgate_core::routing::{
    Navigation, ROOT_PATH, RouteTree, SessionAction, UnmatchedRoutePolicy, build_route_tree,
    navigate,
};
use fitgate_core::session::SessionState;
use serde::Serialize;
use tokio::sync::watch;

use crate::synchronizer::SessionSynchronizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message about a session problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

pub struct AppShell {
    synchronizer: SessionSynchronizer,
    identity_rx: watch::Receiver<IdentitySignal>,
    unmatched: UnmatchedRoutePolicy,
    routes: RouteTree,
    /// Visited locations; the last entry is the current one.
    history: Vec<String>,
    current: Option<Navigation>,
    notices: Vec<Notice>,
}

impl AppShell {
    /// Mounts the shell at `/` and performs the initial identity observation.
    pub fn new(
        state: Arc<SessionState>,
        identity: Arc<dyn IdentityProvider>,
        unmatched: UnmatchedRoutePolicy,
    ) -> Self {
        let identity_rx = identity.subscribe();
        let mut shell = Self {
            synchronizer: SessionSynchronizer::new(state, identity),
            identity_rx,
            unmatched,
            routes: build_route_tree(false, unmatched),
            history: Vec::new(),
            current: None,
            notices: Vec::new(),
        };

        let signal = shell.identity_rx.borrow_and_update().clone();
        // Rejections are recorded as notices; the shell still mounts.
        if let Err(e) = shell.handle_signal(&signal) {
            tracing::warn!("[Shell] Initial identity signal not applied: {}", e);
        }
        if shell.current.is_none()
            && let Err(e) = shell.replace_location(ROOT_PATH)
        {
            tracing::warn!("[Shell] Could not resolve {}: {}", ROOT_PATH, e);
        }
        shell
    }

    pub fn state(&self) -> &Arc<SessionState> {
        self.synchronizer.state()
    }

    pub fn is_ready(&self) -> bool {
        self.synchronizer.is_ready()
    }

    pub fn routes(&self) -> &RouteTree {
        &self.routes
    }

    /// Current location, `/` before anything has been resolved.
    pub fn location(&self) -> &str {
        self.history.last().map(String::as_str).unwrap_or(ROOT_PATH)
    }

    pub fn current(&self) -> Option<&Navigation> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice::new(level, message);
        tracing::debug!("[Shell] Notice ({:?}): {}", notice.level, notice.message);
        self.notices.push(notice);
    }

    /// Reconciles one identity signal and updates routes and location.
    pub fn handle_signal(&mut self, signal: &IdentitySignal) -> Result<()> {
        let was_ready = self.synchronizer.is_ready();
        let applied = self.synchronizer.apply(signal);
        if let Err(e) = &applied {
            self.notify(
                NoticeLevel::Error,
                format!("Sign-in could not be completed: {}", e),
            );
        }

        if self.synchronizer.is_ready() != was_ready || self.current.is_none() {
            self.rebuild_routes();
            let location = self.location().to_string();
            self.replace_location(&location)?;
        }

        applied.map(|_| ())
    }

    fn rebuild_routes(&mut self) {
        let ready = self.synchronizer.is_ready();
        debug_assert!(!ready || self.state().is_authenticated());
        self.routes = build_route_tree(ready, self.unmatched);
        tracing::debug!(
            "[Shell] Rebuilt route tree (authenticated: {})",
            self.routes.is_authenticated()
        );
    }

    /// Processes a pending identity change, if any, without waiting.
    pub fn poll_identity(&mut self) -> Result<bool> {
        if !self.identity_rx.has_changed().unwrap_or(false) {
            return Ok(false);
        }
        let signal = self.identity_rx.borrow_and_update().clone();
        self.handle_signal(&signal)?;
        Ok(true)
    }

    /// Waits for the next identity change and processes it.
    ///
    /// Returns `Ok(false)` once the provider has gone away.
    pub async fn next_identity_change(&mut self) -> Result<bool> {
        if self.identity_rx.changed().await.is_err() {
            return Ok(false);
        }
        let signal = self.identity_rx.borrow_and_update().clone();
        self.handle_signal(&signal)?;
        Ok(true)
    }

    /// Navigates to `url`, pushing the final location onto the history.
    pub fn navigate(&mut self, url: &str) -> Result<&Navigation> {
        let navigation = navigate(&self.routes, url)?;
        self.history.push(navigation.location.clone());
        tracing::debug!("[Shell] Navigated to {}", navigation.location);
        Ok(&*self.current.insert(navigation))
    }

    /// Navigates to `url`, replacing the current history entry.
    pub fn replace_location(&mut self, url: &str) -> Result<&Navigation> {
        let navigation = navigate(&self.routes, url)?;
        match self.history.last_mut() {
            Some(last) => *last = navigation.location.clone(),
            None => self.history.push(navigation.location.clone()),
        }
        Ok(&*self.current.insert(navigation))
    }

    /// Starts the external login flow.
    pub async fn login(&mut self) -> Result<()> {
        let identity = self.synchronizer.identity().clone();
        if let Err(e) = identity.log_in().await {
            self.notify(NoticeLevel::Error, format!("Login failed: {}", e));
            return Err(e);
        }
        Ok(())
    }

    /// Clears the session, logs out of the provider and lands on `/`.
    ///
    /// The session is gone locally even when the provider call fails; that
    /// failure is reported as a notice.
    pub async fn logout(&mut self) -> Result<&Navigation> {
        let report = self.synchronizer.logout().await;
        if let Err(e) = &report.cleared {
            self.notify(
                NoticeLevel::Error,
                format!("Signed out, but the stored session could not be removed: {}", e),
            );
        }
        if let Err(e) = &report.provider {
            self.notify(
                NoticeLevel::Error,
                format!(
                    "Signed out locally, but the identity provider did not confirm: {}",
                    e
                ),
            );
        }

        // The provider's own signed-out signal carries nothing new for us.
        drop(self.identity_rx.borrow_and_update());

        self.rebuild_routes();
        self.replace_location(ROOT_PATH)
    }

    /// Runs the action a layout exposes.
    pub async fn dispatch(&mut self, action: SessionAction) -> Result<()> {
        match action {
            SessionAction::Login => self.login().await,
            SessionAction::Logout => self.logout().await.map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitgate_core::FitgateError;
    use fitgate_core::routing::View;
    use fitgate_core::session::{Claims, SessionStorage};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockStorage {
        items: Mutex<HashMap<String, String>>,
    }

    impl SessionStorage for MockStorage {
        fn get_item(&self, key: &str) -> Result<Option<String>> {
            Ok(self.items.lock().unwrap().get(key).cloned())
        }

        fn set_item(&self, key: &str, value: &str) -> Result<()> {
            self.items
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove_item(&self, key: &str) -> Result<()> {
            self.items.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct MockIdentity {
        signal: watch::Sender<IdentitySignal>,
    }

    /// Identity whose signal channel is owned by the test.
    struct DetachedIdentity {
        rx: watch::Receiver<IdentitySignal>,
        fail_login: bool,
    }

    #[async_trait::async_trait]
    impl IdentityProvider for DetachedIdentity {
        fn current(&self) -> IdentitySignal {
            self.rx.borrow().clone()
        }

        fn subscribe(&self) -> watch::Receiver<IdentitySignal> {
            self.rx.clone()
        }

        async fn log_in(&self) -> Result<()> {
            if self.fail_login {
                return Err(FitgateError::identity("authorization endpoint unreachable"));
            }
            Ok(())
        }

        async fn log_out(&self) -> Result<()> {
            Ok(())
        }
    }

    fn detached_shell(fail_login: bool) -> (AppShell, watch::Sender<IdentitySignal>) {
        let (tx, rx) = watch::channel(IdentitySignal::signed_out());
        let identity = Arc::new(DetachedIdentity { rx, fail_login });
        let state = Arc::new(SessionState::new(Arc::new(MockStorage::default())));
        let shell = AppShell::new(state, identity, UnmatchedRoutePolicy::NotFound);
        (shell, tx)
    }

    #[async_trait::async_trait]
    impl IdentityProvider for MockIdentity {
        fn current(&self) -> IdentitySignal {
            self.signal.borrow().clone()
        }

        fn subscribe(&self) -> watch::Receiver<IdentitySignal> {
            self.signal.subscribe()
        }

        async fn log_in(&self) -> Result<()> {
            Ok(())
        }

        async fn log_out(&self) -> Result<()> {
            self.signal.send_replace(IdentitySignal::signed_out());
            Ok(())
        }
    }

    fn shell_with(signal: IdentitySignal) -> (AppShell, Arc<MockIdentity>) {
        let identity = Arc::new(MockIdentity {
            signal: watch::channel(signal).0,
        });
        let state = Arc::new(SessionState::new(Arc::new(MockStorage::default())));
        let shell = AppShell::new(state, identity.clone(), UnmatchedRoutePolicy::NotFound);
        (shell, identity)
    }

    #[test]
    fn test_mount_signed_out_shows_welcome() {
        let (shell, _) = shell_with(IdentitySignal::signed_out());
        assert!(!shell.is_ready());
        assert!(!shell.routes().is_authenticated());
        assert_eq!(shell.location(), "/");
        assert_eq!(shell.current().unwrap().matched.view, View::Welcome);
    }

    #[test]
    fn test_mount_signed_in_lands_on_activities() {
        let (shell, _) = shell_with(IdentitySignal::signed_in("abc", json!({ "sub": "u1" })));
        assert!(shell.is_ready());
        assert_eq!(shell.location(), "/activities");
        assert_eq!(shell.history(), &["/activities".to_string()]);
    }

    #[test]
    fn test_poll_identity_switches_tree() {
        let (mut shell, identity) = shell_with(IdentitySignal::signed_out());
        assert!(!shell.poll_identity().unwrap());

        identity
            .signal
            .send_replace(IdentitySignal::signed_in("abc", json!({ "sub": "u1" })));
        assert!(shell.poll_identity().unwrap());
        assert!(shell.routes().is_authenticated());
        assert_eq!(shell.location(), "/activities");
        assert_eq!(
            shell.state().current().claims(),
            Some(&Claims::new("u1"))
        );
    }

    #[test]
    fn test_navigate_pushes_history() {
        let (mut shell, _) = shell_with(IdentitySignal::signed_in("abc", json!({ "sub": "u1" })));
        let nav = shell.navigate("/activities/42").unwrap();
        assert_eq!(nav.matched.view, View::ActivityDetail);
        assert_eq!(nav.matched.param("id"), Some("42"));
        assert_eq!(
            shell.history(),
            &["/activities".to_string(), "/activities/42".to_string()]
        );
    }

    #[tokio::test]
    async fn test_dispatch_logout() {
        let (mut shell, _) = shell_with(IdentitySignal::signed_in("abc", json!({ "sub": "u1" })));
        shell.navigate("/activities/7").unwrap();

        shell.dispatch(SessionAction::Logout).await.unwrap();
        assert!(!shell.is_ready());
        assert!(!shell.state().is_authenticated());
        assert_eq!(shell.location(), "/");
        assert_eq!(shell.current().unwrap().matched.view, View::Welcome);
        assert!(!shell.poll_identity().unwrap());
        assert!(shell.notices().is_empty());
    }

    #[test]
    fn test_rejected_claims_become_notice() {
        let (shell, _) = shell_with(IdentitySignal::signed_in("abc", json!({})));
        assert!(!shell.is_ready());
        assert_eq!(shell.notices().len(), 1);
        assert_eq!(shell.notices()[0].level, NoticeLevel::Error);
        assert_eq!(shell.location(), "/");
    }

    #[tokio::test]
    async fn test_next_identity_change_rebuilds_tree() {
        let (mut shell, tx) = detached_shell(false);
        assert!(!shell.routes().is_authenticated());

        tx.send_replace(IdentitySignal::signed_in("abc", json!({ "sub": "u1" })));
        assert!(shell.next_identity_change().await.unwrap());
        assert!(shell.is_ready());
        assert!(shell.routes().is_authenticated());
        assert_eq!(shell.location(), "/activities");

        tx.send_replace(IdentitySignal::signed_out());
        assert!(shell.next_identity_change().await.unwrap());
        assert!(!shell.routes().is_authenticated());
        assert_eq!(shell.location(), "/");
    }

    #[tokio::test]
    async fn test_next_identity_change_ends_when_provider_is_gone() {
        let (mut shell, tx) = detached_shell(false);
        drop(tx);
        assert!(!shell.next_identity_change().await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_login_becomes_notice() {
        let (mut shell, _tx) = detached_shell(true);

        let err = shell.dispatch(SessionAction::Login).await.unwrap_err();
        assert!(matches!(err, FitgateError::Identity(_)));
        assert_eq!(shell.notices().len(), 1);
        assert_eq!(shell.notices()[0].level, NoticeLevel::Error);
        assert!(shell.notices()[0].message.contains("authorization endpoint unreachable"));
        assert!(!shell.is_ready());
    }
}
