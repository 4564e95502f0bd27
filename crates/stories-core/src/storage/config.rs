//! Storage configuration: retention, ordering, visibility and prefetch policy.
//!
//! # File Format
//!
//! Stored as `StorageConfiguration/configuration` under the storage root:
//!
//! ```json
//! {
//!   "storiesLifetime": "positiveInfinity",
//!   "sortType": ["seen", "date"],
//!   "sortOrder": ["ascending", "descending"],
//!   "deleteExpiredStories": false,
//!   "showStoriesOption": "valid",
//!   "prefetchImages": false
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::options::INFINITE_LIFETIME;
use crate::persistence::codec::sentinel_f64;

/// Field stories can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Record creation time.
    Date,
    /// Whether the story was seen (unseen < seen).
    Seen,
}

/// Sort direction of one sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Which stories the default read path returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShowStoriesOption {
    /// Everything in the storage.
    All,
    /// Stories whose lifetime hasn't run out.
    #[default]
    Valid,
    /// Stories the user has already seen.
    Seen,
    /// Stories the user hasn't seen.
    NotSeen,
}

/// Storage policy. One global instance is persisted; callers may also build
/// their own as a per-view override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfiguration {
    /// Default lifetime in seconds for newly added stories.
    #[serde(with = "sentinel_f64")]
    pub stories_lifetime: f64,

    /// Sort keys, highest priority first.
    pub sort_type: Vec<SortKey>,

    /// Direction per sort key, matched by position.
    pub sort_order: Vec<SortOrder>,

    /// Purge expired stories before every read.
    pub delete_expired_stories: bool,

    pub show_stories_option: ShowStoriesOption,

    /// Warm the image cache when stories are added.
    pub prefetch_images: bool,
}

impl Default for StorageConfiguration {
    fn default() -> Self {
        Self {
            stories_lifetime: INFINITE_LIFETIME,
            sort_type: vec![SortKey::Seen, SortKey::Date],
            sort_order: vec![SortOrder::Ascending, SortOrder::Descending],
            delete_expired_stories: false,
            show_stories_option: ShowStoriesOption::Valid,
            prefetch_images: false,
        }
    }
}

impl StorageConfiguration {
    /// Default configuration with an optional lifetime and show option.
    pub fn new(stories_lifetime: Option<f64>, show_stories_option: Option<ShowStoriesOption>) -> Self {
        let defaults = Self::default();
        Self {
            stories_lifetime: stories_lifetime.unwrap_or(defaults.stories_lifetime),
            show_stories_option: show_stories_option.unwrap_or(defaults.show_stories_option),
            ..defaults
        }
    }

    /// Direction for the sort key at `position`.
    ///
    /// Falls back to the last configured direction, then to ascending.
    pub fn direction_for(&self, position: usize) -> SortOrder {
        self.sort_order
            .get(position)
            .or_else(|| self.sort_order.last())
            .copied()
            .unwrap_or_default()
    }
}

// ============================================================================
// Text forms (CLI flags, logs)
// ============================================================================

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Date => write!(f, "date"),
            SortKey::Seen => write!(f, "seen"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "seen" => Ok(SortKey::Seen),
            other => Err(format!("unknown sort key: {other} (expected date or seen)")),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "forward" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "reverse" => Ok(SortOrder::Descending),
            other => Err(format!(
                "unknown sort order: {other} (expected ascending or descending)"
            )),
        }
    }
}

impl fmt::Display for ShowStoriesOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowStoriesOption::All => write!(f, "all"),
            ShowStoriesOption::Valid => write!(f, "valid"),
            ShowStoriesOption::Seen => write!(f, "seen"),
            ShowStoriesOption::NotSeen => write!(f, "not-seen"),
        }
    }
}

impl FromStr for ShowStoriesOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(ShowStoriesOption::All),
            "valid" => Ok(ShowStoriesOption::Valid),
            "seen" => Ok(ShowStoriesOption::Seen),
            "not-seen" | "notseen" | "not_seen" => Ok(ShowStoriesOption::NotSeen),
            other => Err(format!(
                "unknown show option: {other} (expected all, valid, seen or not-seen)"
            )),
        }
    }
}
