pub mod routes;
pub mod session;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use fitgate_application::{AppShell, NoticeLevel};
use fitgate_core::config::AppConfig;
use fitgate_core::session::{RestoreOutcome, SessionState, SessionStorage};
use fitgate_infrastructure::{FileSessionStorage, LocalIdentityProvider};

/// Everything a command needs: the restored session, the identity adapter
/// and the mounted shell.
pub struct App {
    pub config: AppConfig,
    pub session_file: PathBuf,
    pub restored: RestoreOutcome,
    pub identity: Arc<LocalIdentityProvider>,
    pub shell: AppShell,
}

impl App {
    pub fn open(config: AppConfig, session_file: PathBuf) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> = Arc::new(FileSessionStorage::new(&session_file));

        let (state, restored) = SessionState::restore(storage.clone())
            .with_context(|| format!("Failed to read session store {}", session_file.display()))?;
        if let RestoreOutcome::Discarded { reason } = &restored {
            eprintln!(
                "{} discarded stored session: {}",
                "warning:".yellow().bold(),
                reason
            );
        }

        let identity = Arc::new(
            LocalIdentityProvider::with_storage(config.identity.clone(), storage)
                .context("Failed to initialize identity provider")?,
        );
        let shell = AppShell::new(
            Arc::new(state),
            identity.clone(),
            config.routing.unmatched_authenticated,
        );

        Ok(Self {
            config,
            session_file,
            restored,
            identity,
            shell,
        })
    }

    /// Prints and drops the notices the shell collected.
    pub fn flush_notices(&mut self) {
        for notice in self.shell.take_notices() {
            let label = match notice.level {
                NoticeLevel::Info => "info:".cyan().bold(),
                NoticeLevel::Warning => "warning:".yellow().bold(),
                NoticeLevel::Error => "error:".red().bold(),
            };
            eprintln!("{} {}", label, notice.message);
        }
    }
}
