//! Fluent editor over the persisted storage configuration.
//!
//! # Usage
//!
//! ```ignore
//! storage
//!     .configurator()
//!     .order_by_keys(vec![SortKey::Date, SortKey::Seen])
//!     .order_directions(vec![SortOrder::Descending, SortOrder::Ascending])
//!     .delete_expired_stories(true)
//!     .reload();
//! ```
//!
//! Each setter reads the saved configuration, changes one field and writes
//! the whole configuration back. Write failures are logged and dropped.

use super::config::{ShowStoriesOption, SortKey, SortOrder, StorageConfiguration};
use super::StoriesStorage;

pub struct StorageConfigurator<'a> {
    storage: &'a StoriesStorage,
}

impl<'a> StorageConfigurator<'a> {
    pub(crate) fn new(storage: &'a StoriesStorage) -> Self {
        Self { storage }
    }

    /// Default lifetime in seconds for stories added from now on.
    pub fn set_stories_lifetime(&self, lifetime: f64) -> &Self {
        self.update(|c| c.stories_lifetime = lifetime)
    }

    /// Sort by a single key.
    pub fn order_by(&self, key: SortKey) -> &Self {
        self.update(|c| c.sort_type = vec![key])
    }

    /// Sort by several keys, highest priority first. Stories equal on one
    /// key are compared by the next.
    pub fn order_by_keys(&self, keys: Vec<SortKey>) -> &Self {
        self.update(|c| c.sort_type = keys)
    }

    /// One direction for every sort key.
    pub fn order_direction(&self, direction: SortOrder) -> &Self {
        self.update(|c| c.sort_order = vec![direction])
    }

    /// Directions per sort key. If there are fewer directions than keys, the
    /// last direction covers the rest.
    pub fn order_directions(&self, directions: Vec<SortOrder>) -> &Self {
        self.update(|c| c.sort_order = directions)
    }

    pub fn delete_expired_stories(&self, should_delete: bool) -> &Self {
        self.update(|c| c.delete_expired_stories = should_delete)
    }

    pub fn show(&self, option: ShowStoriesOption) -> &Self {
        self.update(|c| c.show_stories_option = option)
    }

    pub fn prefetch_images(&self, should_prefetch: bool) -> &Self {
        self.update(|c| c.prefetch_images = should_prefetch)
    }

    /// Notify subscribers so they re-read with the new configuration.
    pub fn reload(&self) -> &Self {
        self.storage.notify();
        self
    }

    fn update(&self, change: impl FnOnce(&mut StorageConfiguration)) -> &Self {
        self.storage.update_configuration(change);
        self
    }
}
