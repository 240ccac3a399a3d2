//! Infrastructure for Fitgate: persistent session stores, configuration
//! files, path management and a local identity adapter.

pub mod config_service;
pub mod identity;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::identity::LocalIdentityProvider;
pub use crate::paths::FitgatePaths;
pub use crate::storage::{FileSessionStorage, MemorySessionStorage};
