//! Error types for the Fitgate session engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the session and routing engine.
///
/// Variants are structured so callers can tell a caller-side contract
/// violation (`Precondition`, `InvalidClaims`) apart from an environmental
/// failure (`Storage`, `Io`, `Identity`).
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FitgateError {
    /// A caller contract was violated (e.g. committing an empty token).
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Claims reported by the identity provider are unusable.
    #[error("Invalid claims: {0}")]
    InvalidClaims(String),

    /// Persistent session store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", "base64"
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The external identity adapter rejected or failed a call.
    #[error("Identity provider error: {0}")]
    Identity(String),

    /// No route in the active tree matches the path.
    #[error("No route matches '{0}'")]
    NoRoute(String),

    /// Navigation kept redirecting without reaching a view.
    #[error("Redirect loop while resolving '{path}' after {hops} hops")]
    RedirectLoop { path: String, hops: usize },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FitgateError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Creates an InvalidClaims error
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Identity error
    pub fn identity(message: impl Into<String>) -> Self {
        Self::Identity(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this error is a contract violation rather than an environmental failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Precondition(_) | Self::InvalidClaims(_))
    }

    /// Check if this is a storage or IO error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io { .. })
    }

    /// Check if this is a serialization error
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for FitgateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for FitgateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for FitgateError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for FitgateError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for FitgateError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, FitgateError>`.
pub type Result<T> = std::result::Result<T, FitgateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_classification() {
        assert!(FitgateError::precondition("empty token").is_contract_violation());
        assert!(FitgateError::invalid_claims("no sub").is_contract_violation());
        assert!(!FitgateError::storage("disk full").is_contract_violation());
    }

    #[test]
    fn test_io_conversion_keeps_kind() {
        let err: FitgateError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.is_storage());
        assert!(err.to_string().contains("PermissionDenied"));
    }

    #[test]
    fn test_json_conversion() {
        let err: FitgateError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(err.is_serialization());
        assert!(err.to_string().starts_with("Serialization error: JSON"));
    }
}
