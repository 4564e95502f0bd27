use std::path::PathBuf;
use std::sync::Arc;

use super::StoriesStorage;
use crate::image_cache::{ImageCache, NoopImageCache};

/// Configures a [`StoriesStorage`] before opening it.
///
/// ```ignore
/// let storage = StoriesStorage::builder(root)
///     .image_cache(Arc::new(MyCache::default()))
///     .reset_configuration(true)
///     .build();
/// ```
pub struct StoriesStorageBuilder {
    root: PathBuf,
    image_cache: Arc<dyn ImageCache>,
    reset_configuration: bool,
}

impl StoriesStorageBuilder {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_cache: Arc::new(NoopImageCache),
            reset_configuration: false,
        }
    }

    /// Collaborator told to warm and evict story images.
    pub fn image_cache(mut self, image_cache: Arc<dyn ImageCache>) -> Self {
        self.image_cache = image_cache;
        self
    }

    /// Drop any saved configuration when the storage opens.
    pub fn reset_configuration(mut self, reset: bool) -> Self {
        self.reset_configuration = reset;
        self
    }

    pub fn build(self) -> StoriesStorage {
        let storage = StoriesStorage::with_image_cache(&self.root, self.image_cache);
        if self.reset_configuration {
            log::debug!("Resetting storage configuration on open");
            storage.clear_configuration();
        }
        storage
    }
}
