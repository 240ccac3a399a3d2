//! Application layer: keeps the session state in step with the identity
//! provider and gates routing on the result.
//!
//! [`SessionSynchronizer`] is the only place credentials get committed;
//! [`AppShell`] drives it and owns the active route tree.

pub mod shell;
pub mod synchronizer;

pub use shell::{AppShell, Notice, NoticeLevel};
pub use synchronizer::{LogoutReport, Reconciliation, SessionSynchronizer, reconcile};
