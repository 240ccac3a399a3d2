//! Domain core for Fitgate.
//!
//! Session credentials and their persistence contract, the identity adapter
//! contract, and the route trees gated by session state.

pub mod config;
pub mod error;
pub mod identity;
pub mod routing;
pub mod session;

// Re-export common error type
pub use error::{FitgateError, Result};
