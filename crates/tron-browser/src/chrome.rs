//! Chrome executable discovery.
//!
//! Re-exported from `tron_tools::cdp::chrome` — kept here so the browser
//! crate's public surface reads as a complete module on its own, matching how
//! `tron-agent` wires it up (`tron_browser::chrome::find_chrome()`).

pub use tron_tools::cdp::chrome::find_chrome;
