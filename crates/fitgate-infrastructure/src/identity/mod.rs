//! Identity adapter implementations.

pub mod jwt;
mod local_provider;

pub use local_provider::{IDENTITY_TOKEN_KEY, LocalIdentityProvider};
