//! Multi-key ordering of stored stories.
//!
//! The configured sort keys form a lexicographic chain: the first key that
//! tells two records apart decides their order, each key in its own
//! direction. Records equal on every key keep their index-list order.

use std::cmp::Ordering;

use super::config::{SortKey, SortOrder, StorageConfiguration};
use super::options::StoryStoreOptions;

impl SortKey {
    /// Ascending comparison of two records on this key alone.
    pub fn compare(self, a: &StoryStoreOptions, b: &StoryStoreOptions) -> Ordering {
        match self {
            SortKey::Date => a.created_at().cmp(&b.created_at()),
            SortKey::Seen => a.story.is_seen.cmp(&b.story.is_seen),
        }
    }
}

/// Compare two records under `config`'s sort keys and directions.
pub fn compare_options(
    a: &StoryStoreOptions,
    b: &StoryStoreOptions,
    config: &StorageConfiguration,
) -> Ordering {
    for (position, key) in config.sort_type.iter().enumerate() {
        let ordering = match config.direction_for(position) {
            SortOrder::Ascending => key.compare(a, b),
            SortOrder::Descending => key.compare(a, b).reverse(),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Stable sort of `options` under `config`.
pub fn sort_options(options: &mut [StoryStoreOptions], config: &StorageConfiguration) {
    options.sort_by(|a, b| compare_options(a, b, config));
}
