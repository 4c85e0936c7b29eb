//! OpenAI (Codex) auth loading.
//!
//! Unlike Anthropic, the OpenAI/Codex CLI auth flow has no multi-account or
//! legacy-tokens distinction: a single OAuth token pair or a static API key.

use crate::errors::AuthError;
use crate::types::{OAuthTokens, ServerAuth, calculate_expires_at, now_ms};

/// Storage key under which OpenAI/Codex auth is saved.
pub const PROVIDER_KEY: &str = "openai-codex";

const DEFAULT_TOKEN_URL: &str = "https://auth.openai.com/oauth/token";
const DEFAULT_CLIENT_ID: &str = "app_EMoamEEZ73f0CkXaXp7hrann";
const TOKEN_EXPIRY_BUFFER_SECONDS: i64 = 300;

/// Refresh an expired Codex OAuth token.
#[tracing::instrument(skip_all)]
pub async fn refresh_token(refresh_token: &str) -> Result<OAuthTokens, AuthError> {
    let body = serde_json::json!({
        "grant_type": "refresh_token",
        "client_id": DEFAULT_CLIENT_ID,
        "refresh_token": refresh_token,
    });

    let client = reqwest::Client::new();
    let resp = client.post(DEFAULT_TOKEN_URL).json(&body).send().await?;

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
        refresh_token: data.refresh_token,
        expires_at: calculate_expires_at(data.expires_in, TOKEN_EXPIRY_BUFFER_SECONDS),
    })
}

/// Load server auth for the OpenAI/Codex provider.
///
/// Priority:
/// 1. `env_token` (pre-configured OAuth token, e.g. `OPENAI_OAUTH_TOKEN`)
/// 2. Saved OAuth tokens (auto-refreshed if expired)
/// 3. `env_api_key` (e.g. `OPENAI_API_KEY`)
/// 4. Saved API key
#[tracing::instrument(skip_all, fields(provider = "openai"))]
pub async fn load_server_auth(
    auth_path: &std::path::Path,
    env_token: Option<&str>,
    env_api_key: Option<&str>,
) -> Result<Option<ServerAuth>, AuthError> {
    if let Some(token) = env_token {
        return Ok(Some(ServerAuth::OAuth {
            access_token: token.to_string(),
            refresh_token: String::new(),
            expires_at: i64::MAX,
            account_label: None,
        }));
    }

    let pa = crate::storage::get_provider_auth(auth_path, PROVIDER_KEY);

    if let Some(pa) = &pa {
        if let Some(oauth) = &pa.oauth {
            match maybe_refresh_tokens(oauth).await {
                Ok((tokens, refreshed)) => {
                    if refreshed {
                        tracing::info!("persisting refreshed Codex tokens");
                        let _ = crate::storage::save_provider_oauth_tokens(
                            auth_path,
                            PROVIDER_KEY,
                            &tokens,
                        );
                    }
                    return Ok(Some(ServerAuth::from_oauth(&tokens, None)));
                }
                Err(e) => {
                    tracing::warn!("Codex OAuth refresh failed: {e}");
                }
            }
        }
    }

    if let Some(key) = env_api_key {
        return Ok(Some(ServerAuth::from_api_key(key)));
    }

    if let Some(key) = pa.and_then(|pa| pa.api_key) {
        return Ok(Some(ServerAuth::from_api_key(key)));
    }

    Ok(None)
}

async fn maybe_refresh_tokens(tokens: &OAuthTokens) -> Result<(OAuthTokens, bool), AuthError> {
    let buffer_ms = TOKEN_EXPIRY_BUFFER_SECONDS * 1000;
    if now_ms() + buffer_ms < tokens.expires_at {
        return Ok((tokens.clone(), false));
    }

    tracing::info!("Codex OAuth token expired, refreshing...");
    let new_tokens = refresh_token(&tokens.refresh_token).await?;
    Ok((new_tokens, true))
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
}
