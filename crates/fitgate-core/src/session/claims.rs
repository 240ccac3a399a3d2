//! Identity claims carried by an authenticated session.
//!
//! The identity library hands over its decoded token payload as loosely
//! typed JSON. [`Claims::from_value`] is the boundary where that payload is
//! checked for a usable subject before it can reach the session state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{FitgateError, Result};

/// Claims asserted by the identity provider about the logged-in principal.
///
/// `sub` is mandatory and doubles as the owner key for domain resources.
/// Any claim not modelled explicitly is kept in `additional` so the
/// persisted `user` blob round-trips without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - unique identifier for the user.
    pub sub: String,

    /// Issuer - URL of the authorization server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Expiration time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at time (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Remaining provider claims (realm roles, scopes, mapper output, ...).
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

impl Claims {
    /// Creates claims holding only a subject.
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            sub: subject.into(),
            iss: None,
            exp: None,
            iat: None,
            preferred_username: None,
            email: None,
            email_verified: None,
            name: None,
            given_name: None,
            family_name: None,
            additional: BTreeMap::new(),
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the preferred username.
    #[must_use]
    pub fn with_preferred_username(mut self, username: impl Into<String>) -> Self {
        self.preferred_username = Some(username.into());
        self
    }

    /// Validates a raw claims payload from the identity adapter.
    ///
    /// # Errors
    ///
    /// Returns [`FitgateError::InvalidClaims`] when the payload is not a JSON
    /// object, when `sub` is missing or not a string, or when `sub` is empty.
    pub fn from_value(value: &Value) -> Result<Self> {
        let object: &Map<String, Value> = value
            .as_object()
            .ok_or_else(|| FitgateError::invalid_claims("claims payload is not an object"))?;

        match object.get("sub") {
            None => return Err(FitgateError::invalid_claims("claims lack a 'sub' field")),
            Some(Value::String(sub)) if sub.trim().is_empty() => {
                return Err(FitgateError::invalid_claims("claims carry an empty 'sub'"));
            }
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(FitgateError::invalid_claims(format!(
                    "claims 'sub' must be a string, got {other}"
                )));
            }
        }

        serde_json::from_value(value.clone())
            .map_err(|e| FitgateError::invalid_claims(format!("malformed claims: {e}")))
    }

    /// Parses the serialized form stored under the `user` key.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Serializes the claims for the `user` key.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The subject, used as the user identifier.
    pub fn subject(&self) -> &str {
        &self.sub
    }

    /// Best human-readable label for the principal.
    pub fn display_name(&self) -> &str {
        self.preferred_username
            .as_deref()
            .or(self.name.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.sub)
    }
}
