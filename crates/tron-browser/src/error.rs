//! Browser error type.
//!
//! Re-exported from `tron_tools::cdp::error` so callers on either side of the
//! `tron-browser` / `tron-tools` boundary see the same error type.

pub use tron_tools::cdp::error::BrowserError;
