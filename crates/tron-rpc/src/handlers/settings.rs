//! Settings handlers: get, update.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RpcContext;
use crate::errors::RpcError;
use crate::handlers::require_param;
use crate::registry::MethodHandler;

/// Get current settings.
pub struct GetSettingsHandler;

#[async_trait]
impl MethodHandler for GetSettingsHandler {
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let settings =
            tron_settings::load_settings_from_path(&ctx.settings_path).unwrap_or_default();

        serde_json::to_value(settings).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

/// Update settings.
pub struct UpdateSettingsHandler;

#[async_trait]
impl MethodHandler for UpdateSettingsHandler {
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let updates = require_param(params.as_ref(), "settings")?.clone();

        // Load current settings as JSON
        let current = if ctx.settings_path.exists() {
            let content = std::fs::read_to_string(&ctx.settings_path).map_err(|e| {
                RpcError::Internal {
                    message: format!("Failed to read settings: {e}"),
                }
            })?;
            serde_json::from_str::<Value>(&content).unwrap_or_else(|_| Value::Object(serde_json::Map::default()))
        } else {
            Value::Object(serde_json::Map::default())
        };

        // Deep merge updates over current
        let merged = tron_settings::deep_merge(current, updates);

        // Ensure parent directory exists
        if let Some(parent) = ctx.settings_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        // Write back
        let content = serde_json::to_string_pretty(&merged).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })?;
        std::fs::write(&ctx.settings_path, content).map_err(|e| RpcError::Internal {
            message: format!("Failed to write settings: {e}"),
        })?;

        Ok(serde_json::json!({ "success": true }))
    }
}
