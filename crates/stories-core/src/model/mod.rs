//! Story domain types.
//!
//! These are produced by whatever layer fetches stories (out of scope here)
//! and stored verbatim. The storage only inspects `id`, `is_seen` and the
//! image URLs.

pub mod story;

pub use story::{
    ControlsColorMode, FrameAction, FrameContent, FrameGradient, FramePosition, Story, StoryFrame,
};
