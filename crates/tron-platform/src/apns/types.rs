//! Request/response types for a single APNs push.

use std::collections::HashMap;

/// A push notification to deliver through APNs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApnsNotification {
    /// Alert title.
    pub title: String,
    /// Alert body.
    pub body: String,
    /// Custom payload merged alongside `aps`, forwarded to the client app.
    pub data: HashMap<String, String>,
    /// APNs priority: `"high"` (10) delivers immediately, `"normal"` (5) is
    /// batched by Apple for power efficiency.
    pub priority: String,
    /// Sound file name, or `None` for a silent push.
    pub sound: Option<String>,
    /// App icon badge count.
    pub badge: Option<i32>,
    /// Groups notifications in the notification center.
    pub thread_id: Option<String>,
}

impl ApnsNotification {
    /// `true` if neither `title` nor `body` is set — a content-available
    /// silent push used to wake the app without showing an alert.
    pub fn is_silent(&self) -> bool {
        self.title.is_empty() && self.body.is_empty()
    }

    pub(super) fn priority_header(&self) -> &'static str {
        if self.priority == "high" { "10" } else { "5" }
    }
}

/// Outcome of sending a notification to one device token.
#[derive(Debug, Clone)]
pub struct ApnsSendResult {
    /// The device token this result is for.
    pub device_token: String,
    /// `true` if Apple accepted the push (HTTP 200).
    pub success: bool,
    /// HTTP status code Apple returned.
    pub status_code: Option<u16>,
    /// Apple's `reason` field from the JSON error body, e.g. `"Unregistered"`.
    pub reason: Option<String>,
    /// Human-readable error, set when `success` is `false`.
    pub error: Option<String>,
    /// The `apns-id` response header, Apple's identifier for this push.
    pub apns_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_push_detection() {
        let n = ApnsNotification {
            title: String::new(),
            body: String::new(),
            data: HashMap::new(),
            priority: "normal".into(),
            sound: None,
            badge: None,
            thread_id: None,
        };
        assert!(n.is_silent());
    }

    #[test]
    fn alert_push_is_not_silent() {
        let n = ApnsNotification {
            title: "Hi".into(),
            body: String::new(),
            data: HashMap::new(),
            priority: "normal".into(),
            sound: None,
            badge: None,
            thread_id: None,
        };
        assert!(!n.is_silent());
    }

    #[test]
    fn priority_header_mapping() {
        let mut n = ApnsNotification {
            title: "T".into(),
            body: "B".into(),
            data: HashMap::new(),
            priority: "high".into(),
            sound: None,
            badge: None,
            thread_id: None,
        };
        assert_eq!(n.priority_header(), "10");
        n.priority = "normal".into();
        assert_eq!(n.priority_header(), "5");
    }
}
