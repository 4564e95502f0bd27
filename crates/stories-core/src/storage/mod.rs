//! Stories storage: CRUD over story records with policy-driven filtering,
//! ordering, expiry and change notification.
//!
//! # Overview
//!
//! [`StoriesStorage`] owns three [`FileStore`]s (records, the index list,
//! the configuration) and the subscriber list. The host creates one handle
//! at startup and shares it (usually behind an `Arc`).
//!
//! Every call re-reads from disk, so a caller always sees its own writes.
//!
//! # Concurrency
//!
//! Public operations are serialized by an internal lock, so threads sharing
//! one handle cannot lose each other's index updates. Subscribers are
//! notified after the lock is released and may read the storage from
//! `update()`. Separate handles (or processes) over the same directory are
//! not coordinated.
//!
//! # Failure Behavior
//!
//! Multi-step operations are not transactional:
//!
//! - `replace` clears, then adds. A failure in between leaves the storage
//!   empty.
//! - `delete_where` and the expiry purge remove record files one by one and
//!   write the index list once at the end. A failure mid-loop leaves index
//!   entries pointing at removed files.

pub mod builder;
pub mod config;
pub mod configurator;
pub mod options;
pub mod sort;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::event_bus::{EventBus, StorageEvent};
use crate::image_cache::{ImageCache, NoopImageCache};
use crate::model::Story;
use crate::paths;
use crate::persistence::FileStore;
use crate::publisher::{Publisher, Subscriber, SubscriberList};

pub use builder::StoriesStorageBuilder;
pub use config::{ShowStoriesOption, SortKey, SortOrder, StorageConfiguration};
pub use configurator::StorageConfigurator;
pub use options::{StoryStoreOptions, INFINITE_LIFETIME};

const RECORDS_NAMESPACE: &str = "StoryStoreOptions";
const INDEXES_NAMESPACE: &str = "Indexes";
const CONFIGURATION_NAMESPACE: &str = "StorageConfiguration";

const ALL_STORIES_KEY: &str = "allStories";
const CONFIGURATION_KEY: &str = "configuration";

/// File-backed store of stories.
pub struct StoriesStorage {
    records: FileStore<StoryStoreOptions>,
    indexes: FileStore<Vec<String>>,
    configurations: FileStore<StorageConfiguration>,
    image_cache: Arc<dyn ImageCache>,
    subscribers: SubscriberList,
    events: EventBus,
    lock: Mutex<()>,
}

impl StoriesStorage {
    /// Open (or lazily create) a storage rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Self {
        Self::with_image_cache(root, Arc::new(NoopImageCache))
    }

    /// Start configuring a storage rooted at `root`.
    pub fn builder(root: impl AsRef<Path>) -> StoriesStorageBuilder {
        StoriesStorageBuilder::new(root.as_ref())
    }

    /// Open a storage that warms and evicts images through `image_cache`.
    pub fn with_image_cache(root: impl AsRef<Path>, image_cache: Arc<dyn ImageCache>) -> Self {
        let root = root.as_ref();
        log::debug!("Opening stories storage at {}", root.display());

        Self {
            records: FileStore::new(root, RECORDS_NAMESPACE),
            indexes: FileStore::new(root, INDEXES_NAMESPACE),
            configurations: FileStore::new(root, CONFIGURATION_NAMESPACE),
            image_cache,
            subscribers: SubscriberList::new(),
            events: EventBus::new(),
            lock: Mutex::new(()),
        }
    }

    /// Open the storage at the default location (see [`paths::default_storage_root`]).
    pub fn open_default() -> StorageResult<Self> {
        let root = paths::default_storage_root().map_err(|e| {
            StorageError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, e))
        })?;
        Ok(Self::open(root))
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// The persisted configuration, or the default if none is saved or it
    /// can't be read.
    pub fn configuration(&self) -> StorageConfiguration {
        match self.configurations.get(CONFIGURATION_KEY) {
            Ok(configuration) => configuration,
            Err(StorageError::NoDataSaved(_)) => StorageConfiguration::default(),
            Err(e) => {
                log::debug!("Falling back to default storage configuration: {}", e);
                StorageConfiguration::default()
            }
        }
    }

    /// Persist `configuration`. Failures are logged, not returned.
    pub fn set_configuration(&self, configuration: &StorageConfiguration) {
        let _guard = self.lock();
        self.write_configuration(configuration);
    }

    /// Remove the persisted configuration so reads return the default again.
    pub fn clear_configuration(&self) {
        let _guard = self.lock();
        match self.configurations.remove(CONFIGURATION_KEY) {
            Ok(()) | Err(StorageError::NoDataSaved(_)) => {}
            Err(e) => log::warn!("Failed to clear storage configuration: {}", e),
        }
    }

    /// Fluent editor over the persisted configuration.
    pub fn configurator(&self) -> StorageConfigurator<'_> {
        StorageConfigurator::new(self)
    }

    /// Read-modify-write of the configuration under the storage lock.
    pub(crate) fn update_configuration(&self, update: impl FnOnce(&mut StorageConfiguration)) {
        let _guard = self.lock();
        let mut configuration = self.configuration();
        update(&mut configuration);
        self.write_configuration(&configuration);
    }

    fn write_configuration(&self, configuration: &StorageConfiguration) {
        if let Err(e) = self.configurations.set(CONFIGURATION_KEY, configuration) {
            log::warn!("Failed to save storage configuration: {}", e);
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add one story. `lifetime` defaults to the configured stories lifetime.
    pub fn add(&self, story: Story, lifetime: Option<f64>) -> StorageResult<()> {
        let count = {
            let _guard = self.lock();
            self.insert_locked(vec![story], lifetime)?
        };
        self.notify_with(StorageEvent::Added { count });
        Ok(())
    }

    /// Add several stories with a single index write and a single notification.
    pub fn add_all(
        &self,
        stories: impl IntoIterator<Item = Story>,
        lifetime: Option<f64>,
    ) -> StorageResult<()> {
        let stories: Vec<Story> = stories.into_iter().collect();
        let count = {
            let _guard = self.lock();
            self.insert_locked(stories, lifetime)?
        };
        self.notify_with(StorageEvent::Added { count });
        Ok(())
    }

    /// Remove everything, then add `stories`.
    pub fn replace(
        &self,
        stories: impl IntoIterator<Item = Story>,
        lifetime: Option<f64>,
    ) -> StorageResult<()> {
        let stories: Vec<Story> = stories.into_iter().collect();
        let count = {
            let _guard = self.lock();
            self.clear_locked()?;
            self.insert_locked(stories, lifetime)?
        };
        log::info!("Replaced stored stories with {} new ones", count);
        self.notify_with(StorageEvent::Replaced { count });
        Ok(())
    }

    /// Update stored stories that match by id, add the rest.
    ///
    /// Updated records get the new story and lifetime but keep their index
    /// and creation date.
    pub fn create_or_update(
        &self,
        stories: impl IntoIterator<Item = Story>,
        lifetime: Option<f64>,
    ) -> StorageResult<()> {
        let stories: Vec<Story> = stories.into_iter().collect();
        let (updated, added) = {
            let _guard = self.lock();
            self.create_or_update_locked(stories, lifetime)?
        };
        self.notify_with(StorageEvent::Updated { updated, added });
        Ok(())
    }

    /// Delete every record holding `story` (matched by id).
    ///
    /// Deleting a story that isn't stored is not an error.
    pub fn delete(&self, story: &Story) -> StorageResult<()> {
        self.delete_where(|options| options.story == *story)
    }

    /// Delete every record matching `predicate`.
    pub fn delete_where(
        &self,
        predicate: impl Fn(&StoryStoreOptions) -> bool,
    ) -> StorageResult<()> {
        let count = {
            let _guard = self.lock();
            self.remove_where_locked(predicate)?
        };
        self.notify_with(StorageEvent::Deleted { count });
        Ok(())
    }

    /// Delete all stories and evict their images.
    pub fn clear(&self) -> StorageResult<()> {
        {
            let _guard = self.lock();
            self.clear_locked()?;
        }
        log::info!("Cleared stories storage");
        self.notify_with(StorageEvent::Cleared);
        Ok(())
    }

    /// Mark the stored copy of `story` as seen or unseen.
    ///
    /// Rewrites every stored story through `create_or_update`, which also
    /// resets each record's lifetime to the configured default.
    pub fn set_story_seen_state(&self, story: &Story, is_seen: bool) -> StorageResult<()> {
        {
            let _guard = self.lock();
            let configuration = self.configuration();
            let mut stories: Vec<Story> = self
                .stored_options_locked(&configuration)?
                .into_iter()
                .map(|options| options.story)
                .collect();

            if let Some(stored) = stories.iter_mut().find(|s| **s == *story) {
                stored.is_seen = is_seen;
            }

            self.create_or_update_locked(stories, None)?;
        }
        self.notify_with(StorageEvent::SeenStateChanged {
            story_id: story.id.clone(),
            is_seen,
        });
        Ok(())
    }

    /// Remove expired records now, whatever `delete_expired_stories` says.
    ///
    /// Returns how many were removed. Subscribers are only notified if
    /// something was.
    pub fn purge_expired(&self) -> StorageResult<usize> {
        let count = {
            let _guard = self.lock();
            self.purge_expired_locked()?
        };
        if count > 0 {
            self.notify_with(StorageEvent::Expired { count });
        }
        Ok(count)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All stored stories, sorted by the configured keys.
    pub fn get_stories(&self) -> StorageResult<Vec<Story>> {
        self.get_stories_where(|_| true)
    }

    /// Stored stories whose record matches `predicate`, sorted.
    pub fn get_stories_where(
        &self,
        predicate: impl Fn(&StoryStoreOptions) -> bool,
    ) -> StorageResult<Vec<Story>> {
        Ok(self
            .get_stored_options()?
            .into_iter()
            .filter(|options| predicate(options))
            .map(|options| options.story)
            .collect())
    }

    /// Stories that haven't expired yet.
    ///
    /// With `lifetime`, validity is `created_at + lifetime` instead of each
    /// record's own expiration date.
    pub fn get_valid_stories(&self, lifetime: Option<f64>) -> StorageResult<Vec<Story>> {
        let now = Utc::now();
        self.get_stories_where(|options| options.is_valid_at(now, lifetime))
    }

    pub fn get_seen_stories(&self) -> StorageResult<Vec<Story>> {
        self.get_stories_where(|options| options.story.is_seen)
    }

    pub fn get_not_seen_stories(&self) -> StorageResult<Vec<Story>> {
        self.get_stories_where(|options| !options.story.is_seen)
    }

    /// Stories selected by the show option of `custom` (a per-view override)
    /// or of the persisted configuration.
    pub fn get_stories_to_show(
        &self,
        custom: Option<&StorageConfiguration>,
    ) -> StorageResult<Vec<Story>> {
        let show = match custom {
            Some(configuration) => configuration.show_stories_option,
            None => self.configuration().show_stories_option,
        };

        match show {
            ShowStoriesOption::All => self.get_stories(),
            ShowStoriesOption::Valid => {
                self.get_valid_stories(custom.map(|c| c.stories_lifetime))
            }
            ShowStoriesOption::Seen => self.get_seen_stories(),
            ShowStoriesOption::NotSeen => self.get_not_seen_stories(),
        }
    }

    /// Stored records with their metadata, sorted.
    pub fn get_stored_options(&self) -> StorageResult<Vec<StoryStoreOptions>> {
        let _guard = self.lock();
        let configuration = self.configuration();
        self.stored_options_locked(&configuration)
    }

    // ========================================================================
    // Notification
    // ========================================================================

    /// Receive a [`StorageEvent`] for every future notification.
    pub fn changes(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    /// Tell everyone to re-read without changing anything.
    pub(crate) fn notify(&self) {
        self.notify_with(StorageEvent::Reloaded);
    }

    fn notify_with(&self, event: StorageEvent) {
        log::debug!("Notifying {} storage subscribers: {:?}", self.subscribers.len(), event);
        self.subscribers.notify();
        self.events.emit(event);
    }

    // ========================================================================
    // Internals (caller holds the lock)
    // ========================================================================

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn insert_locked(&self, stories: Vec<Story>, lifetime: Option<f64>) -> StorageResult<usize> {
        let configuration = self.configuration();
        let lifetime = lifetime.unwrap_or(configuration.stories_lifetime);

        let mut inserted = Vec::with_capacity(stories.len());
        for story in stories {
            let index = Uuid::new_v4().to_string();
            let options = StoryStoreOptions::new(story, index.clone(), lifetime);
            self.records.set(&index, &options)?;
            inserted.push(options);
        }

        let mut indexes = self.load_indexes();
        indexes.extend(inserted.iter().map(|options| options.index().to_string()));
        self.indexes.set(ALL_STORIES_KEY, &indexes)?;

        if configuration.prefetch_images {
            for options in &inserted {
                self.warm_images(&options.story);
            }
        }

        Ok(inserted.len())
    }

    /// Returns `(updated, added)`.
    fn create_or_update_locked(
        &self,
        stories: Vec<Story>,
        lifetime: Option<f64>,
    ) -> StorageResult<(usize, usize)> {
        let configuration = self.configuration();
        let mut updated = 0;
        let mut added = 0;

        for story in stories {
            let existing = self
                .stored_options_locked(&configuration)?
                .into_iter()
                .find(|options| options.story == story);

            match existing {
                Some(mut options) => {
                    options.story = story;
                    options.lifetime = lifetime.unwrap_or(configuration.stories_lifetime);
                    self.records.set(options.index(), &options)?;
                    updated += 1;
                }
                None => {
                    added += self.insert_locked(vec![story], lifetime)?;
                }
            }
        }

        Ok((updated, added))
    }

    fn remove_where_locked(
        &self,
        predicate: impl Fn(&StoryStoreOptions) -> bool,
    ) -> StorageResult<usize> {
        let indexes = self.load_indexes();
        let mut kept = Vec::with_capacity(indexes.len());
        let mut removed = 0;

        for index in indexes {
            let options = self.records.get(&index)?;
            if predicate(&options) {
                self.records.remove(&index)?;
                self.evict_images(&options.story);
                removed += 1;
            } else {
                kept.push(index);
            }
        }

        self.indexes.set(ALL_STORIES_KEY, &kept)?;
        Ok(removed)
    }

    fn purge_expired_locked(&self) -> StorageResult<usize> {
        let now = Utc::now();
        let removed = self.remove_where_locked(|options| options.is_expired_at(now))?;
        if removed > 0 {
            log::info!("Purged {} expired stories", removed);
        }
        Ok(removed)
    }

    fn clear_locked(&self) -> StorageResult<()> {
        match self.read_all_locked() {
            Ok(records) => {
                for options in &records {
                    self.evict_images(&options.story);
                }
            }
            Err(e) => log::warn!("Failed to read stories before clearing, skipping eviction: {}", e),
        }

        self.records.clear_all()?;
        self.indexes.clear_all()?;
        Ok(())
    }

    /// Purge if configured, then read every record and sort.
    fn stored_options_locked(
        &self,
        configuration: &StorageConfiguration,
    ) -> StorageResult<Vec<StoryStoreOptions>> {
        if configuration.delete_expired_stories {
            if let Err(e) = self.purge_expired_locked() {
                log::warn!("Failed to purge expired stories: {}", e);
            }
        }

        let mut records = self.read_all_locked()?;
        sort::sort_options(&mut records, configuration);
        Ok(records)
    }

    /// Records in index-list order.
    fn read_all_locked(&self) -> StorageResult<Vec<StoryStoreOptions>> {
        self.load_indexes()
            .iter()
            .map(|index| self.records.get(index))
            .collect()
    }

    fn load_indexes(&self) -> Vec<String> {
        match self.indexes.get(ALL_STORIES_KEY) {
            Ok(indexes) => indexes,
            Err(StorageError::NoDataSaved(_)) => Vec::new(),
            Err(e) => {
                log::warn!("Failed to load story index, treating it as empty: {}", e);
                Vec::new()
            }
        }
    }

    fn warm_images(&self, story: &Story) {
        for url in story.image_urls() {
            self.image_cache.warm(url);
        }
    }

    fn evict_images(&self, story: &Story) {
        for url in story.image_urls() {
            self.image_cache.evict(url);
        }
    }
}

impl Publisher for StoriesStorage {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.subscribe(subscriber);
    }

    fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) {
        self.subscribers.unsubscribe(subscriber);
    }
}

// ============================================================================
// TESTS
// ============================================================================
