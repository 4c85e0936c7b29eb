//! [`BrowserDelegate`] implementation backed by the CDP [`BrowserService`].
//!
//! This is the glue between the tool layer (`tron-tools::traits::BrowserDelegate`,
//! consumed by `BrowseTheWebTool`) and the actual Chrome automation backend.
//! Action dispatch mirrors the `ACTIONS` list in
//! `tron_tools::browser::browse_the_web`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tron_tools::errors::ToolError;
use tron_tools::traits::{BrowserAction, BrowserDelegate, BrowserResult};
use tron_tools::utils::validation::{get_optional_string, get_optional_u64};

use crate::service::BrowserService;

/// Drives CDP browser sessions for the `BrowseTheWeb` tool.
pub struct CdpBrowserDelegate {
    service: Arc<BrowserService>,
}

impl CdpBrowserDelegate {
    /// Wrap a [`BrowserService`] as a [`BrowserDelegate`].
    pub fn new(service: Arc<BrowserService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BrowserDelegate for CdpBrowserDelegate {
    async fn execute_action(
        &self,
        session_id: &str,
        action: &BrowserAction,
    ) -> Result<BrowserResult, ToolError> {
        let session = self.service.get_or_create(session_id).await?;

        match action.action.as_str() {
            "navigate" => {
                let url = get_optional_string(&action.params, "url").ok_or_else(|| {
                    ToolError::Validation {
                        message: "navigate requires a url".into(),
                    }
                })?;
                session.navigate(&url).await?;
                Ok(BrowserResult {
                    content: format!("Navigated to {url}"),
                    details: None,
                })
            }
            "back" => {
                session.go_back().await?;
                Ok(BrowserResult {
                    content: "Navigated back".into(),
                    details: None,
                })
            }
            "forward" => {
                session.go_forward().await?;
                Ok(BrowserResult {
                    content: "Navigated forward".into(),
                    details: None,
                })
            }
            "reload" => {
                session.reload().await?;
                Ok(BrowserResult {
                    content: "Page reloaded".into(),
                    details: None,
                })
            }
            "click" => {
                let selector = require_selector(action)?;
                session.click(&selector).await?;
                Ok(BrowserResult {
                    content: format!("Clicked {selector}"),
                    details: None,
                })
            }
            "fill" => {
                let selector = require_selector(action)?;
                let value = get_optional_string(&action.params, "value").unwrap_or_default();
                session.fill(&selector, &value).await?;
                Ok(BrowserResult {
                    content: format!("Filled {selector}"),
                    details: None,
                })
            }
            "type" => {
                let text = get_optional_string(&action.params, "text").ok_or_else(|| {
                    ToolError::Validation {
                        message: "type requires text".into(),
                    }
                })?;
                session.type_text(&text).await?;
                Ok(BrowserResult {
                    content: "Typed text".into(),
                    details: None,
                })
            }
            "select" => {
                let selector = require_selector(action)?;
                let value = get_optional_string(&action.params, "value").unwrap_or_default();
                session.select_option(&selector, &value).await?;
                Ok(BrowserResult {
                    content: format!("Selected {value} on {selector}"),
                    details: None,
                })
            }
            "hover" => {
                let selector = require_selector(action)?;
                session.hover(&selector).await?;
                Ok(BrowserResult {
                    content: format!("Hovered {selector}"),
                    details: None,
                })
            }
            "press" => {
                let key = get_optional_string(&action.params, "key").ok_or_else(|| {
                    ToolError::Validation {
                        message: "press requires a key".into(),
                    }
                })?;
                session.press_key(&key).await?;
                Ok(BrowserResult {
                    content: format!("Pressed {key}"),
                    details: None,
                })
            }
            "screenshot" => {
                let data = session.screenshot().await?;
                Ok(BrowserResult {
                    content: "Captured screenshot".into(),
                    details: Some(json!({"base64": data})),
                })
            }
            "snapshot" => {
                let tree = session.snapshot().await?;
                Ok(BrowserResult {
                    content: tree,
                    details: None,
                })
            }
            "get_text" => {
                let selector = require_selector(action)?;
                let text = session.get_text(&selector).await?;
                Ok(BrowserResult {
                    content: text,
                    details: None,
                })
            }
            "get_attribute" => {
                let selector = require_selector(action)?;
                let attribute = get_optional_string(&action.params, "attribute").ok_or_else(
                    || ToolError::Validation {
                        message: "get_attribute requires an attribute name".into(),
                    },
                )?;
                let value = session.get_attribute(&selector, &attribute).await?;
                Ok(BrowserResult {
                    content: value.unwrap_or_default(),
                    details: None,
                })
            }
            "wait_for" => {
                let selector = require_selector(action)?;
                let timeout_ms = get_optional_u64(&action.params, "timeoutMs").unwrap_or(5000);
                session.wait_for(&selector, timeout_ms).await?;
                Ok(BrowserResult {
                    content: format!("{selector} appeared"),
                    details: None,
                })
            }
            "scroll" => {
                let direction =
                    get_optional_string(&action.params, "direction").unwrap_or_else(|| "down".into());
                let amount = get_optional_u64(&action.params, "amount").unwrap_or(400) as i64;
                session.scroll(&direction, amount).await?;
                Ok(BrowserResult {
                    content: format!("Scrolled {direction} by {amount}"),
                    details: None,
                })
            }
            "pdf" => {
                let path = get_optional_string(&action.params, "path").ok_or_else(|| {
                    ToolError::Validation {
                        message: "pdf requires an output path".into(),
                    }
                })?;
                session.pdf(&path).await?;
                Ok(BrowserResult {
                    content: format!("Saved PDF to {path}"),
                    details: None,
                })
            }
            other => Err(ToolError::Validation {
                message: format!("unsupported browser action: {other}"),
            }),
        }
    }

    async fn close_session(&self, session_id: &str) -> Result<(), ToolError> {
        self.service.close_session(session_id).await?;
        Ok(())
    }
}

fn require_selector(action: &BrowserAction) -> Result<String, ToolError> {
    get_optional_string(&action.params, "selector").ok_or_else(|| ToolError::Validation {
        message: format!("{} requires a selector", action.action),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_selector_missing_errors() {
        let action = BrowserAction {
            action: "click".into(),
            params: json!({}),
        };
        assert!(require_selector(&action).is_err());
    }

    #[test]
    fn require_selector_present() {
        let action = BrowserAction {
            action: "click".into(),
            params: json!({"selector": "#submit"}),
        };
        assert_eq!(require_selector(&action).unwrap(), "#submit");
    }
}
