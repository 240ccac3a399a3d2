//! Session domain: claims, the credential triple, the state container and
//! the persistent store contract.

pub mod claims;
pub mod credential;
pub mod state;
pub mod storage;

pub use claims::Claims;
pub use credential::SessionCredential;
pub use state::{RestoreOutcome, SessionState};
pub use storage::{
    SESSION_KEYS, SessionStorage, StorageOp, TOKEN_KEY, USER_ID_KEY, USER_KEY,
};
