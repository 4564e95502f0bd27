//! # stories-core
//!
//! Local persistence and configuration engine for Instagram-style stories.
//!
//! This crate has no UI dependencies and can be used by:
//! - a native app shell (through the [`ImageCache`] and [`Subscriber`] seams)
//! - the `stories` CLI
//! - background sync tasks (via the [`event_bus`] change feed)
//!
//! ## Key Concepts
//!
//! - **Story**: an opaque, serializable payload identified by its `id`
//! - **StoryStoreOptions**: the persisted record wrapping a story with its
//!   index, lifetime and creation date
//! - **StorageConfiguration**: persisted policy for ordering, filtering,
//!   expiry and image prefetching
//! - **StoriesStorage**: the orchestrator tying the above together

pub mod error;
pub mod event_bus;
pub mod image_cache;
pub mod model;
pub mod paths;
pub mod persistence;
pub mod publisher;
pub mod storage;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use event_bus::{EventBus, StorageEvent};
pub use image_cache::{ImageCache, NoopImageCache};
pub use model::{Story, StoryFrame};
pub use publisher::{Publisher, Subscriber};
pub use storage::{
    ShowStoriesOption, SortKey, SortOrder, StorageConfiguration, StorageConfigurator,
    StoriesStorage, StoriesStorageBuilder, StoryStoreOptions, INFINITE_LIFETIME,
};
