//! Persistent session store implementations.

mod atomic_toml;
mod file_session_storage;
mod memory_session_storage;

pub use atomic_toml::AtomicTomlFile;
pub use file_session_storage::FileSessionStorage;
pub use memory_session_storage::MemorySessionStorage;
