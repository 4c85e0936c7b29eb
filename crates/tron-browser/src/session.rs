//! CDP browser session.
//!
//! Re-exported from `tron_tools::cdp::session` so `tron-browser` exposes a
//! single session type shared with the tool layer.

pub use tron_tools::cdp::session::BrowserSession;
