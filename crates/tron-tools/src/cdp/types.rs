//! Browser streaming types.
//!
//! Wire format matches the iOS `BrowserFramePlugin.DataPayload` exactly.

use serde::{Deserialize, Serialize};

/// A single screencast frame delivered to iOS.
///
/// Wire format:
/// ```json
/// {
///   "sessionId": "sess_abc",
///   "data": "<base64-jpeg>",
///   "frameId": 42,
///   "timestamp": 1707999045123,
///   "metadata": { ... }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserFrame {
    /// Session this frame belongs to.
    pub session_id: String,
    /// Base64-encoded JPEG image data.
    pub data: String,
    /// Monotonically increasing frame counter.
    pub frame_id: u64,
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Viewport metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FrameMetadata>,
}

/// Viewport metadata for a screencast frame.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    /// Top offset of the page content.
    pub offset_top: f64,
    /// Device pixel ratio.
    pub page_scale_factor: f64,
    /// Viewport width in device pixels.
    pub device_width: u32,
    /// Viewport height in device pixels.
    pub device_height: u32,
    /// Horizontal scroll offset.
    pub scroll_offset_x: f64,
    /// Vertical scroll offset.
    pub scroll_offset_y: f64,
}

impl Default for FrameMetadata {
    fn default() -> Self {
        Self {
            offset_top: 0.0,
            page_scale_factor: 1.0,
            device_width: 1280,
            device_height: 800,
            scroll_offset_x: 0.0,
            scroll_offset_y: 0.0,
        }
    }
}

/// Screencast configuration options.
#[derive(Clone, Debug)]
pub struct ScreencastOptions {
    /// JPEG quality (0-100).
    pub quality: u32,
    /// Image format.
    pub format: ScreencastFormat,
    /// Maximum capture width.
    pub max_width: u32,
    /// Maximum capture height.
    pub max_height: u32,
    /// Capture every Nth frame (1 = every frame).
    pub every_nth_frame: u32,
}

impl Default for ScreencastOptions {
    fn default() -> Self {
        Self {
            quality: 60,
            format: ScreencastFormat::Jpeg,
            max_width: 1280,
            max_height: 800,
            every_nth_frame: 1,
        }
    }
}

/// Screencast image format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreencastFormat {
    /// JPEG format.
    Jpeg,
    /// PNG format.
    Png,
}

impl ScreencastFormat {
    /// CDP protocol string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

/// Events emitted by browser sessions on the broadcast channel.
#[derive(Clone, Debug)]
pub enum BrowserEvent {
    /// A screencast frame is ready.
    Frame {
        /// Session this frame belongs to.
        session_id: String,
        /// The frame data.
        frame: BrowserFrame,
    },
    /// A browser session was closed.
    Closed {
        /// Session that was closed.
        session_id: String,
    },
}

/// Status of a browser session.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserStatus {
    /// Whether a browser instance exists for this session.
    pub has_browser: bool,
    /// Whether screencast streaming is active.
    pub is_streaming: bool,
    /// Current page URL (if any).
    pub current_url: Option<String>,
}
