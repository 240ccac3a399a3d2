//! Application configuration model.
//!
//! Loaded from `config.toml`; every section and field has a default so a
//! partial file (or none at all) is valid.

use serde::{Deserialize, Serialize};

use crate::routing::UnmatchedRoutePolicy;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    pub routing: RoutingConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// OAuth2/PKCE client settings handed to the identity library.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Must match the client registered with the identity provider.
    pub client_id: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    /// Where the provider sends the browser back after authentication.
    pub redirect_uri: String,
    /// Space-separated scopes.
    pub scope: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: "oauth2-pkce-client".to_string(),
            authorization_endpoint:
                "http://localhost:8181/realms/fitness-oauth2/protocol/openid-connect/auth"
                    .to_string(),
            token_endpoint:
                "http://localhost:8181/realms/fitness-oauth2/protocol/openid-connect/token"
                    .to_string(),
            redirect_uri: "http://localhost:5173".to_string(),
            scope: "openid profile email offline_access".to_string(),
        }
    }
}

impl IdentityConfig {
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Behaviour for authenticated requests to undeclared paths.
    pub unmatched_authenticated: UnmatchedRoutePolicy,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the default session file location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<std::path::PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.identity.client_id, "oauth2-pkce-client");
        assert_eq!(
            config.routing.unmatched_authenticated,
            UnmatchedRoutePolicy::NotFound
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_document() {
        let config: AppConfig = toml::from_str(
            r#"
            [routing]
            unmatched_authenticated = "redirect_to_activities"

            [identity]
            client_id = "mobile"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.routing.unmatched_authenticated,
            UnmatchedRoutePolicy::RedirectToActivities
        );
        assert_eq!(config.identity.client_id, "mobile");
        assert_eq!(config.identity.redirect_uri, "http://localhost:5173");
    }

    #[test]
    fn test_scopes() {
        let identity = IdentityConfig::default();
        let scopes: Vec<&str> = identity.scopes().collect();
        assert_eq!(scopes, vec!["openid", "profile", "email", "offline_access"]);
    }
}
