//! APNs HTTP/2 push client.
//!
//! Signs a provider JWT (ES256, per Apple's token-based auth) and POSTs to
//! `/3/device/{token}` for each target device. The provider token is cached
//! and re-signed only when it nears Apple's one-hour expiry — minting a new
//! one per push would get the key rate-limited.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};

use super::config::ApnsConfig;
use super::error::ApnsError;
use super::types::{ApnsNotification, ApnsSendResult};

/// Provider tokens are valid for up to an hour; re-sign before that to stay safe.
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

#[derive(Serialize)]
struct ProviderClaims {
    iss: String,
    iat: i64,
}

struct CachedToken {
    jwt: String,
    signed_at: Instant,
}

/// Drives push delivery to Apple's APNs HTTP/2 endpoint for one app.
pub struct ApnsService {
    config: ApnsConfig,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    token: Mutex<Option<CachedToken>>,
}

impl ApnsService {
    /// Build a service from a loaded config, reading and parsing the `.p8` key.
    pub fn new(config: ApnsConfig) -> Result<Self, ApnsError> {
        let key_bytes = std::fs::read(config.resolved_key_path())?;
        let encoding_key = EncodingKey::from_ec_pem(&key_bytes)?;
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .http2_prior_knowledge()
            .build()?;

        Ok(Self {
            config,
            encoding_key,
            client,
            token: Mutex::new(None),
        })
    }

    /// The bundle ID this service sends to.
    pub fn bundle_id(&self) -> &str {
        &self.config.bundle_id
    }

    fn provider_token(&self) -> Result<String, ApnsError> {
        let mut cached = self.token.lock();
        if let Some(t) = cached.as_ref() {
            if t.signed_at.elapsed() < TOKEN_TTL {
                return Ok(t.jwt.clone());
            }
        }

        let mut header = Header::new(Algorithm::ES256);
        header.kid = Some(self.config.key_id.clone());
        let claims = ProviderClaims {
            iss: self.config.team_id.clone(),
            iat: chrono::Utc::now().timestamp(),
        };
        let jwt = jsonwebtoken::encode(&header, &claims, &self.encoding_key)?;
        *cached = Some(CachedToken {
            jwt: jwt.clone(),
            signed_at: Instant::now(),
        });
        Ok(jwt)
    }

    fn build_payload(notification: &ApnsNotification) -> Value {
        let mut aps = Map::new();
        if notification.is_silent() {
            let _ = aps.insert("content-available".into(), Value::from(1));
        } else {
            let mut alert = Map::new();
            let _ = alert.insert("title".into(), Value::String(notification.title.clone()));
            let _ = alert.insert("body".into(), Value::String(notification.body.clone()));
            let _ = aps.insert("alert".into(), Value::Object(alert));
        }
        if let Some(ref sound) = notification.sound {
            let _ = aps.insert("sound".into(), Value::String(sound.clone()));
        }
        if let Some(badge) = notification.badge {
            let _ = aps.insert("badge".into(), Value::from(badge));
        }
        if let Some(ref thread_id) = notification.thread_id {
            let _ = aps.insert("thread-id".into(), Value::String(thread_id.clone()));
        }

        let mut payload = Map::new();
        let _ = payload.insert("aps".into(), Value::Object(aps));
        for (k, v) in &notification.data {
            let _ = payload.insert(k.clone(), Value::String(v.clone()));
        }
        Value::Object(payload)
    }

    /// Send one notification to a single device token.
    pub async fn send_one(
        &self,
        device_token: &str,
        notification: &ApnsNotification,
    ) -> ApnsSendResult {
        let token = match self.provider_token() {
            Ok(t) => t,
            Err(e) => {
                return ApnsSendResult {
                    device_token: device_token.to_string(),
                    success: false,
                    status_code: None,
                    reason: None,
                    error: Some(e.to_string()),
                    apns_id: None,
                };
            }
        };

        let url = format!(
            "https://{}/3/device/{device_token}",
            self.config.apns_host()
        );
        let push_type = if notification.is_silent() {
            "background"
        } else {
            "alert"
        };

        let request = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header("apns-topic", &self.config.bundle_id)
            .header("apns-push-type", push_type)
            .header("apns-priority", notification.priority_header())
            .json(&Self::build_payload(notification));

        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                let apns_id = resp
                    .headers()
                    .get("apns-id")
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);

                if status.is_success() {
                    ApnsSendResult {
                        device_token: device_token.to_string(),
                        success: true,
                        status_code: Some(status.as_u16()),
                        reason: None,
                        error: None,
                        apns_id,
                    }
                } else {
                    let body: Value = resp.json().await.unwrap_or(Value::Null);
                    let reason = body
                        .get("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    ApnsSendResult {
                        device_token: device_token.to_string(),
                        success: false,
                        status_code: Some(status.as_u16()),
                        reason: reason.clone(),
                        error: Some(reason.unwrap_or_else(|| format!("HTTP {status}"))),
                        apns_id,
                    }
                }
            }
            Err(e) => ApnsSendResult {
                device_token: device_token.to_string(),
                success: false,
                status_code: None,
                reason: None,
                error: Some(e.to_string()),
                apns_id: None,
            },
        }
    }

    /// Send one notification to many device tokens concurrently.
    pub async fn send_to_many(
        self: &Arc<Self>,
        device_tokens: &[String],
        notification: &ApnsNotification,
    ) -> Vec<ApnsSendResult> {
        let futures = device_tokens.iter().map(|token| {
            let this = Arc::clone(self);
            let token = token.clone();
            let notification = notification.clone();
            async move { this.send_one(&token, &notification).await }
        });
        join_all(futures).await
    }
}
