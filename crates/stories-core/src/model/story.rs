//! Story and frame types.
//!
//! The JSON shape follows the remote stories feed:
//!
//! ```json
//! {
//!   "id": "summer-sale",
//!   "title": "Summer sale",
//!   "image": "https://cdn.example.com/preview.jpg",
//!   "frames": [
//!     {
//!       "image": "https://cdn.example.com/frame-1.jpg",
//!       "content": { "position": "bottom", "textColor": "#FFFFFF", ... }
//!     }
//!   ],
//!   "isLiked": false,
//!   "isSeen": false
//! }
//! ```

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::persistence::codec::{empty_string_as_none, sentinel_f64_opt};

// ============================================================================
// Story
// ============================================================================

/// A sequence of frames shown full-screen, plus liked/seen flags.
///
/// Two stories are equal when their `id`s are equal, whatever the other
/// fields say. The storage relies on this to find the stored copy of a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    /// Stable identifier.
    pub id: String,

    pub title: String,

    /// Preview image shown in the stories list.
    #[serde(
        rename = "image",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub image_url: Option<String>,

    pub frames: Vec<StoryFrame>,

    #[serde(default)]
    pub is_liked: bool,

    #[serde(default)]
    pub is_seen: bool,
}

impl Story {
    /// Create an empty story with a freshly generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), title)
    }

    /// Create an empty story with a known id.
    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: None,
            frames: Vec::new(),
            is_liked: false,
            is_seen: false,
        }
    }

    /// True if at least one frame hasn't been shown yet.
    pub fn has_not_shown_frames(&self) -> bool {
        self.frames.iter().any(|f| !f.is_already_shown)
    }

    /// Every remote image this story references: the preview first, then
    /// each frame's image in order.
    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        self.image_url
            .as_deref()
            .into_iter()
            .chain(self.frames.iter().filter_map(|f| f.image_url.as_deref()))
    }
}

impl PartialEq for Story {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Story {}

impl Hash for Story {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ============================================================================
// Frames
// ============================================================================

/// One slide within a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryFrame {
    pub content: FrameContent,

    #[serde(
        rename = "image",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_already_shown: bool,
}

impl StoryFrame {
    pub fn new(content: FrameContent, image_url: Option<String>) -> Self {
        Self {
            content,
            image_url,
            is_already_shown: false,
        }
    }
}

/// Text overlay and styling of a frame. Carried as-is by the storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameContent {
    pub position: FramePosition,

    /// Hex color, e.g. `#FFFFFF`.
    pub text_color: String,

    #[serde(default)]
    pub gradient_color: Option<String>,

    #[serde(default, with = "sentinel_f64_opt")]
    pub gradient_start_alpha: Option<f64>,

    #[serde(default)]
    pub header1: Option<String>,

    #[serde(default)]
    pub header2: Option<String>,

    #[serde(rename = "descriptions", default)]
    pub paragraphs: Vec<String>,

    #[serde(default)]
    pub action: Option<FrameAction>,

    #[serde(rename = "controlsColor")]
    pub controls_color_mode: ControlsColorMode,

    pub gradient: FrameGradient,
}

impl Default for FrameContent {
    fn default() -> Self {
        Self {
            position: FramePosition::Bottom,
            text_color: "#000000".to_string(),
            gradient_color: None,
            gradient_start_alpha: Some(0.7),
            header1: None,
            header2: None,
            paragraphs: Vec::new(),
            action: None,
            controls_color_mode: ControlsColorMode::Dark,
            gradient: FrameGradient::Bottom,
        }
    }
}

/// A call-to-action button on a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameAction {
    #[serde(rename = "name")]
    pub text: String,

    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FramePosition {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlsColorMode {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FrameGradient {
    Top,
    Bottom,
    Both,
    None,
}

// ============================================================================
// TESTS
// ============================================================================
