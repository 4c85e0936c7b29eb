//! Browser streaming types.
//!
//! Re-exported from `tron_tools::cdp::types` so that the frame/event types flowing
//! through [`crate::delegate::CdpBrowserDelegate`] are identical to the ones the
//! underlying CDP session/service use internally.

pub use tron_tools::cdp::types::{
    BrowserEvent, BrowserFrame, BrowserStatus, FrameMetadata, ScreencastFormat, ScreencastOptions,
};
