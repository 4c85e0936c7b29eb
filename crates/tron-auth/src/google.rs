//! Google/Gemini OAuth implementation.
//!
//! Supports two endpoints:
//! - **Cloud Code Assist**: the production endpoint, requires a discovered project ID.
//! - **Antigravity**: a free-tier/sandbox endpoint with a default project fallback.

use crate::errors::AuthError;
use crate::types::{
    GoogleOAuthEndpoint, OAuthConfig, OAuthTokens, ServerAuth, calculate_expires_at, now_ms,
};

/// Default project for the Antigravity free tier.
pub const ANTIGRAVITY_DEFAULT_PROJECT: &str = "rising-fact-p41fc";

/// Google OAuth configuration plus the API endpoint it talks to.
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    /// Base OAuth configuration.
    pub oauth: OAuthConfig,
    /// API base URL for this endpoint.
    pub api_endpoint: String,
    /// API version segment used in request URLs.
    pub api_version: String,
}

/// Resolved Google auth: the generic server auth plus endpoint routing info
/// needed to build Gemini request URLs and headers.
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    pub auth: ServerAuth,
    pub endpoint: Option<GoogleOAuthEndpoint>,
    pub api_endpoint: Option<String>,
    pub api_version: Option<String>,
    pub project_id: Option<String>,
}

/// Cloud Code Assist OAuth configuration.
pub fn cloud_code_assist_config() -> GoogleOAuthConfig {
    GoogleOAuthConfig {
        oauth: OAuthConfig {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            redirect_uri: "http://localhost:45289".to_string(),
            client_id: String::new(),
            client_secret: None,
            scopes: vec![
                "https://www.googleapis.com/auth/cloud-platform".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "openid".to_string(),
            ],
            token_expiry_buffer_seconds: 300,
        },
        api_endpoint: "https://cloudcode-pa.googleapis.com".to_string(),
        api_version: "v1internal".to_string(),
    }
}

/// Antigravity OAuth configuration.
pub fn antigravity_config() -> GoogleOAuthConfig {
    GoogleOAuthConfig {
        oauth: OAuthConfig {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            redirect_uri: "http://localhost:51121/oauth-callback".to_string(),
            client_id: String::new(),
            client_secret: None,
            scopes: vec![
                "https://www.googleapis.com/auth/cloud-platform".to_string(),
                "https://www.googleapis.com/auth/userinfo.email".to_string(),
                "https://www.googleapis.com/auth/userinfo.profile".to_string(),
                "https://www.googleapis.com/auth/cclog".to_string(),
                "https://www.googleapis.com/auth/experimentsandconfigs".to_string(),
                "openid".to_string(),
            ],
            token_expiry_buffer_seconds: 300,
        },
        api_endpoint: "https://daily-cloudcode-pa.sandbox.googleapis.com".to_string(),
        api_version: "v1internal".to_string(),
    }
}

/// Get the config for a Google OAuth endpoint.
pub fn get_config(endpoint: GoogleOAuthEndpoint) -> GoogleOAuthConfig {
    match endpoint {
        GoogleOAuthEndpoint::CloudCodeAssist => cloud_code_assist_config(),
        GoogleOAuthEndpoint::Antigravity => antigravity_config(),
    }
}

/// Build the authorization URL for browser redirect.
pub fn get_authorization_url(config: &GoogleOAuthConfig, challenge: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&code_challenge={}&code_challenge_method=S256&access_type=offline&prompt=consent",
        config.oauth.auth_url,
        urlencoded(&config.oauth.client_id),
        urlencoded(&config.oauth.redirect_uri),
        urlencoded(&config.oauth.scopes.join(" ")),
        urlencoded(challenge),
    )
}

/// Exchange an authorization code for tokens.
#[tracing::instrument(skip_all)]
pub async fn exchange_code_for_tokens(
    config: &GoogleOAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<OAuthTokens, AuthError> {
    let body = [
        ("grant_type", "authorization_code"),
        ("client_id", &config.oauth.client_id),
        ("code", code),
        ("redirect_uri", &config.oauth.redirect_uri),
        ("code_verifier", verifier),
    ];
    let body = with_client_secret(&body, config);

    let client = reqwest::Client::new();
    let resp = client.post(&config.oauth.token_url).form(&body).send().await?;

    let status = resp.status().as_u16();
    if status != 200 {
        let text = resp.text().await.unwrap_or_default();
        return Err(AuthError::OAuth {
            status,
            message: text,
        });
    }

    let data: TokenResponse = resp.json().await?;
    Ok(OAuthTokens {
        access_token: data.access_token,
        refresh_token: data.refresh_token.unwrap_or_default(),
        expires_at: calculate_expires_at(data.expires_in, config.oauth.token_expiry_buffer_seconds),
    })
}

/// Refresh an expired OAuth token.
#[tracing::instrument(skip_all, fields(provider = "google"))]
pub async fn refresh_token(
    config: &GoogleOAuthConfig,
    refresh_token: &str,
) -> Result<OAuthTokens, AuthError> {
    let body = [
        ("grant_type", "refresh_token"),
        ("client_id", &config.oauth.client_id),
        ("refresh_token", refresh_token),
    ];
    let body = with_client_secret(&body, config);

    let client = reqwest::Client::new();
    let resp = client.post(&config.oauth.token_url).form(&body).send().await?;

    let status = resp.status().as_u16();
    if status != 200 {
        let text = resp.text().await.unwrap_or_default();
        return Err(AuthError::OAuth {
            status,
            message: text,
        });
    }

    let data: TokenResponse = resp.json().await?;
    Ok(OAuthTokens {
        access_token: data.access_token,
        refresh_token: data
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string()),
        expires_at: calculate_expires_at(data.expires_in, config.oauth.token_expiry_buffer_seconds),
    })
}

fn with_client_secret<'a>(
    body: &[(&'a str, &'a str)],
    config: &'a GoogleOAuthConfig,
) -> Vec<(&'a str, &'a str)> {
    let mut body = body.to_vec();
    if let Some(secret) = &config.oauth.client_secret {
        body.push(("client_secret", secret));
    }
    body
}

/// Check if a token looks like a Google OAuth token.
///
/// Google access tokens start with `ya29.` or are JWT-shaped (3 dot-separated parts).
pub fn is_oauth_token(token: &str) -> bool {
    token.starts_with("ya29.") || token.split('.').count() == 3
}

/// Build the Gemini API URL for a model action.
///
/// OAuth routes through `{api_endpoint}/{api_version}:{action}` (model goes in
/// the request body). API-key auth uses the standard Gemini REST path.
pub fn get_api_url(auth: &GoogleAuth, model: &str, action: &str) -> String {
    if auth.auth.is_oauth() {
        let endpoint = auth
            .api_endpoint
            .as_deref()
            .unwrap_or("https://cloudcode-pa.googleapis.com");
        let version = auth.api_version.as_deref().unwrap_or("v1internal");
        format!("{endpoint}/{version}:{action}")
    } else {
        format!("https://generativelanguage.googleapis.com/v1beta/models/{model}:{action}")
    }
}

/// Build request headers for a Gemini API call.
pub fn get_api_headers(auth: &GoogleAuth) -> Vec<(String, String)> {
    let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];

    match &auth.auth {
        ServerAuth::OAuth { access_token, .. } => {
            headers.push(("Authorization".to_string(), format!("Bearer {access_token}")));
        }
        ServerAuth::ApiKey { api_key } => {
            headers.push(("x-goog-api-key".to_string(), api_key.clone()));
        }
    }

    if let Some(project) = &auth.project_id {
        headers.push(("x-goog-user-project".to_string(), project.clone()));
    }

    headers
}

/// Load server auth for the Google/Gemini provider.
///
/// Priority:
/// 1. `env_token` (pre-configured OAuth token)
/// 2. Saved OAuth tokens from `auth.json` (auto-refreshed if expired)
/// 3. `env_api_key`
/// 4. Saved API key from `auth.json`
#[tracing::instrument(skip_all, fields(provider = "google"))]
pub async fn load_server_auth(
    auth_path: &std::path::Path,
    env_token: Option<&str>,
    env_api_key: Option<&str>,
) -> Result<Option<GoogleAuth>, AuthError> {
    if let Some(token) = env_token {
        return Ok(Some(GoogleAuth {
            auth: ServerAuth::OAuth {
                access_token: token.to_string(),
                refresh_token: String::new(),
                expires_at: i64::MAX,
                account_label: None,
            },
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: None,
        }));
    }

    let gpa = crate::storage::get_google_provider_auth(auth_path);

    if let Some(gpa) = &gpa {
        if let Some(oauth) = &gpa.base.oauth {
            let endpoint = gpa.endpoint.unwrap_or_default();
            let cfg = get_config(endpoint);

            match maybe_refresh_tokens(oauth, &cfg).await {
                Ok((tokens, refreshed)) => {
                    if refreshed {
                        tracing::info!("persisting refreshed Google tokens");
                        let mut updated = gpa.clone();
                        updated.base.oauth = Some(tokens.clone());
                        let _ = crate::storage::save_google_provider_auth(auth_path, &updated);
                    }
                    return Ok(Some(GoogleAuth {
                        auth: ServerAuth::from_oauth(&tokens, None),
                        endpoint: Some(endpoint),
                        api_endpoint: Some(cfg.api_endpoint),
                        api_version: Some(cfg.api_version),
                        project_id: gpa.project_id.clone(),
                    }));
                }
                Err(e) => {
                    tracing::warn!("Google OAuth refresh failed: {e}");
                }
            }
        }
    }

    if let Some(key) = env_api_key {
        return Ok(Some(GoogleAuth {
            auth: ServerAuth::from_api_key(key),
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: None,
        }));
    }

    if let Some(key) = gpa.as_ref().and_then(|gpa| gpa.base.api_key.clone()) {
        return Ok(Some(GoogleAuth {
            auth: ServerAuth::from_api_key(key),
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: None,
        }));
    }

    Ok(None)
}

/// Refresh tokens if expired, returning `(tokens, was_refreshed)`.
async fn maybe_refresh_tokens(
    tokens: &OAuthTokens,
    config: &GoogleOAuthConfig,
) -> Result<(OAuthTokens, bool), AuthError> {
    let buffer_ms = config.oauth.token_expiry_buffer_seconds * 1000;
    if now_ms() + buffer_ms < tokens.expires_at {
        return Ok((tokens.clone(), false));
    }

    tracing::info!("Google OAuth token expired, refreshing...");
    let new_tokens = refresh_token(config, &tokens.refresh_token).await?;
    Ok((new_tokens, true))
}

/// Google token endpoint response.
#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

/// Simple URL encoding for query parameters.
fn urlencoded(s: &str) -> String {
    s.replace('%', "%25")
        .replace(' ', "%20")
        .replace('&', "%26")
        .replace('=', "%3D")
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace(':', "%3A")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GoogleProviderAuth, ProviderAuth};

    #[test]
    fn cloud_code_assist_config_values() {
        let cfg = cloud_code_assist_config();
        assert!(cfg.oauth.auth_url.contains("accounts.google.com"));
        assert!(cfg.api_endpoint.contains("cloudcode-pa"));
        assert_eq!(cfg.api_version, "v1internal");
    }

    #[test]
    fn antigravity_config_values() {
        let cfg = antigravity_config();
        assert!(cfg.api_endpoint.contains("sandbox"));
        assert!(cfg.oauth.scopes.len() > 3);
    }

    #[test]
    fn is_oauth_token_patterns() {
        assert!(is_oauth_token("ya29.abc123"));
        assert!(is_oauth_token("header.payload.signature"));
        assert!(!is_oauth_token("sk-123"));
        assert!(!is_oauth_token(""));
    }

    #[test]
    fn authorization_url_has_offline_access() {
        let cfg = cloud_code_assist_config();
        let url = get_authorization_url(&cfg, "challenge");
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn api_url_oauth_format() {
        let auth = GoogleAuth {
            auth: ServerAuth::OAuth {
                access_token: "tok".to_string(),
                refresh_token: "ref".to_string(),
                expires_at: 0,
                account_label: None,
            },
            endpoint: Some(GoogleOAuthEndpoint::CloudCodeAssist),
            api_endpoint: Some("https://cloudcode-pa.googleapis.com".to_string()),
            api_version: Some("v1internal".to_string()),
            project_id: Some("proj-123".to_string()),
        };
        let url = get_api_url(&auth, "gemini-2.0-flash", "generateContent");
        assert_eq!(
            url,
            "https://cloudcode-pa.googleapis.com/v1internal:generateContent"
        );
    }

    #[test]
    fn api_url_api_key_format() {
        let auth = GoogleAuth {
            auth: ServerAuth::from_api_key("key-123"),
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: None,
        };
        let url = get_api_url(&auth, "gemini-2.0-flash", "generateContent");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn api_headers_oauth() {
        let auth = GoogleAuth {
            auth: ServerAuth::OAuth {
                access_token: "ya29.abc".to_string(),
                refresh_token: "ref".to_string(),
                expires_at: 0,
                account_label: None,
            },
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: Some("my-proj".to_string()),
        };
        let headers = get_api_headers(&auth);
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v.contains("ya29.abc"))
        );
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "x-goog-user-project" && v == "my-proj")
        );
    }

    #[test]
    fn api_headers_api_key() {
        let auth = GoogleAuth {
            auth: ServerAuth::from_api_key("key-123"),
            endpoint: None,
            api_endpoint: None,
            api_version: None,
            project_id: None,
        };
        let headers = get_api_headers(&auth);
        assert!(
            headers
                .iter()
                .any(|(k, v)| k == "x-goog-api-key" && v == "key-123")
        );
        assert!(!headers.iter().any(|(k, _)| k == "x-goog-user-project"));
    }

    #[tokio::test]
    async fn load_server_auth_env_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        let result = load_server_auth(&path, Some("env-tok"), None).await.unwrap();
        let auth = result.unwrap();
        assert!(auth.auth.is_oauth());
        assert_eq!(auth.auth.token(), "env-tok");
    }

    #[tokio::test]
    async fn load_server_auth_env_api_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        let result = load_server_auth(&path, None, Some("env-key")).await.unwrap();
        let auth = result.unwrap();
        assert!(!auth.auth.is_oauth());
        assert_eq!(auth.auth.token(), "env-key");
    }

    #[tokio::test]
    async fn load_server_auth_none_when_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        let result = load_server_auth(&path, None, None).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn load_server_auth_fresh_oauth() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        let gpa = GoogleProviderAuth {
            base: ProviderAuth {
                oauth: Some(OAuthTokens {
                    access_token: "ya29.fresh".to_string(),
                    refresh_token: "ref".to_string(),
                    expires_at: now_ms() + 3_600_000,
                }),
                ..Default::default()
            },
            endpoint: Some(GoogleOAuthEndpoint::Antigravity),
            ..Default::default()
        };
        crate::storage::save_google_provider_auth(&path, &gpa).unwrap();

        let result = load_server_auth(&path, None, None).await.unwrap();
        let auth = result.unwrap();
        assert_eq!(auth.auth.token(), "ya29.fresh");
        assert_eq!(auth.endpoint, Some(GoogleOAuthEndpoint::Antigravity));
    }

    #[tokio::test]
    async fn load_server_auth_saved_api_key() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("auth.json");

        let gpa = GoogleProviderAuth {
            base: ProviderAuth {
                api_key: Some("sk-google".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        crate::storage::save_google_provider_auth(&path, &gpa).unwrap();

        let result = load_server_auth(&path, None, None).await.unwrap();
        let auth = result.unwrap();
        assert!(!auth.auth.is_oauth());
        assert_eq!(auth.auth.token(), "sk-google");
    }
}
