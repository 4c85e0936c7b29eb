//! Shared auth data types: OAuth tokens, provider auth, and the on-disk
//! auth storage schema.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A pair of OAuth tokens plus their absolute expiry (ms since epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

/// Static OAuth client configuration for a provider.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub auth_url: String,
    pub token_url: String,
    pub redirect_uri: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub token_expiry_buffer_seconds: i64,
}

/// Resolved auth for a single provider request, handed to a provider crate.
#[derive(Debug, Clone)]
pub enum ServerAuth {
    OAuth {
        access_token: String,
        refresh_token: String,
        expires_at: i64,
        account_label: Option<String>,
    },
    ApiKey {
        api_key: String,
    },
}

impl ServerAuth {
    /// Build an OAuth variant from a token pair and an optional account label.
    #[must_use]
    pub fn from_oauth(tokens: &OAuthTokens, account_label: Option<String>) -> Self {
        Self::OAuth {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at,
            account_label,
        }
    }

    /// Build an API key variant.
    #[must_use]
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        Self::ApiKey {
            api_key: api_key.into(),
        }
    }

    /// Whether this auth is OAuth-based (vs. a static API key).
    #[must_use]
    pub fn is_oauth(&self) -> bool {
        matches!(self, Self::OAuth { .. })
    }

    /// The bearer token / API key to send on the wire.
    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::OAuth { access_token, .. } => access_token,
            Self::ApiKey { api_key } => api_key,
        }
    }
}

/// One saved account's OAuth tokens, keyed by a human-readable label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountEntry {
    pub label: String,
    pub oauth: OAuthTokens,
}

/// Persisted auth for one provider: an API key, legacy single OAuth tokens,
/// and/or a list of named multi-account OAuth tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthTokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts: Option<Vec<AccountEntry>>,
}

/// Which Google OAuth backend the saved tokens were issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoogleOAuthEndpoint {
    #[default]
    CloudCodeAssist,
    Antigravity,
}

/// Persisted Google auth: the generic provider auth plus Google-specific
/// endpoint selection and Cloud Code Assist project ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleProviderAuth {
    #[serde(flatten)]
    pub base: ProviderAuth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<GoogleOAuthEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Auth for an auxiliary service (e.g. Brave search) unrelated to LLM providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAuth {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_keys: Option<Vec<String>>,
}

/// On-disk schema for `~/.tron/auth.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStorage {
    pub version: u32,
    #[serde(default)]
    pub providers: HashMap<String, ProviderAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleProviderAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<HashMap<String, ServiceAuth>>,
    #[serde(default)]
    pub last_updated: String,
}

impl Default for AuthStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStorage {
    /// A fresh, empty storage document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: 1,
            providers: HashMap::new(),
            google: None,
            services: None,
            last_updated: String::new(),
        }
    }

    /// Get a provider's saved auth, if any.
    #[must_use]
    pub fn get_provider_auth(&self, provider: &str) -> Option<ProviderAuth> {
        self.providers.get(provider).cloned()
    }

    /// Replace a provider's saved auth.
    pub fn set_provider_auth(&mut self, provider: &str, auth: &ProviderAuth) {
        self.providers.insert(provider.to_string(), auth.clone());
    }

    /// Get the saved Google auth, if any.
    #[must_use]
    pub fn get_google_auth(&self) -> Option<GoogleProviderAuth> {
        self.google.clone()
    }

    /// Replace the saved Google auth.
    pub fn set_google_auth(&mut self, auth: &GoogleProviderAuth) {
        self.google = Some(auth.clone());
    }

    /// Get a named service's auth, if any.
    #[must_use]
    pub fn get_service_auth(&self, service: &str) -> Option<&ServiceAuth> {
        self.services.as_ref()?.get(service)
    }

    /// Collect all API keys configured for a named service.
    #[must_use]
    pub fn get_service_api_keys(&self, service: &str) -> Vec<String> {
        let Some(auth) = self.get_service_auth(service) else {
            return Vec::new();
        };
        let mut keys = Vec::new();
        if let Some(key) = &auth.api_key {
            keys.push(key.clone());
        }
        if let Some(extra) = &auth.api_keys {
            keys.extend(extra.iter().cloned());
        }
        keys
    }
}

/// Current time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Turn an OAuth `expires_in` (seconds) into an absolute ms timestamp, minus
/// a buffer (seconds) so refresh happens slightly before the token actually expires.
#[must_use]
pub fn calculate_expires_at(expires_in: i64, buffer_seconds: i64) -> i64 {
    now_ms() + (expires_in - buffer_seconds).max(0) * 1000
}

/// Whether a token pair is due for refresh, given a buffer in milliseconds.
#[must_use]
pub fn should_refresh(tokens: &OAuthTokens, buffer_ms: i64) -> bool {
    now_ms() + buffer_ms >= tokens.expires_at
}
