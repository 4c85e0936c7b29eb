//! Multi-session browser service.
//!
//! Re-exported from `tron_tools::cdp::service` — `tron-browser` is the crate
//! responsible for owning and wiring up a [`BrowserService`] at startup
//! (Chrome discovery, session map, screencast broadcast channel); the
//! implementation itself lives in `tron-tools` alongside the CDP session it
//! manages, so the tool layer can depend on it without depending on this crate.

pub use tron_tools::cdp::service::BrowserService;
