//! The session credential triple.

use serde::{Deserialize, Serialize};

use super::claims::Claims;
use crate::error::{FitgateError, Result};

/// Who is logged in, as far as the application is concerned.
///
/// Token and claims are held together, so a half-set credential cannot be
/// represented. The user id is always derived from `claims.sub`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionCredential {
    /// All-absent triple.
    #[default]
    Anonymous,
    /// Token, claims and (derived) user id all present.
    Authenticated { token: String, claims: Claims },
}

impl SessionCredential {
    /// Builds an authenticated credential, enforcing the commit preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`FitgateError::Precondition`] if the token is empty or the
    /// claims carry an empty subject.
    pub fn authenticated(token: impl Into<String>, claims: Claims) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(FitgateError::precondition(
                "commit requires a non-empty token",
            ));
        }
        if claims.sub.trim().is_empty() {
            return Err(FitgateError::precondition(
                "commit requires claims with a non-empty subject",
            ));
        }
        Ok(Self::Authenticated { token, claims })
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Authenticated { token, .. } => Some(token),
            Self::Anonymous => None,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Authenticated { claims, .. } => Some(claims),
            Self::Anonymous => None,
        }
    }

    /// The domain-resource owner key, equal to the claims subject.
    pub fn user_id(&self) -> Option<&str> {
        self.claims().map(Claims::subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_anonymous() {
        let credential = SessionCredential::default();
        assert!(!credential.is_authenticated());
        assert!(credential.token().is_none());
        assert!(credential.claims().is_none());
        assert!(credential.user_id().is_none());
    }

    #[test]
    fn test_user_id_follows_subject() {
        let credential = SessionCredential::authenticated("abc", Claims::new("u1")).unwrap();
        assert_eq!(credential.token(), Some("abc"));
        assert_eq!(credential.user_id(), Some("u1"));
    }

    #[test]
    fn test_rejects_empty_token() {
        let err = SessionCredential::authenticated("", Claims::new("u1")).unwrap_err();
        assert!(matches!(err, FitgateError::Precondition(_)));
    }

    #[test]
    fn test_rejects_empty_subject() {
        let err = SessionCredential::authenticated("abc", Claims::new("")).unwrap_err();
        assert!(err.to_string().contains("subject"));
    }
}
