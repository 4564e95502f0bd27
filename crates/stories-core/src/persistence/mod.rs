//! Persistence layer for stories, the story index, and storage configuration.
//!
//! # Overview
//!
//! Everything is stored as JSON files through [`FileStore`], one namespace
//! directory per stored type:
//!
//! ```text
//! {root}/
//! ├── StoryStoreOptions/
//! │   ├── <index>                 # One record per story
//! │   └── ...
//! ├── Indexes/
//! │   └── allStories              # Ordered list of record indices
//! └── StorageConfiguration/
//!     └── configuration           # Retention, sort and visibility policy
//! ```
//!
//! # Design Principles
//!
//! ## Atomic Writes
//!
//! All save operations use write-then-rename to prevent corruption:
//!
//! 1. Write to `{key}.tmp`
//! 2. Rename to `{key}` (atomic on Unix)
//!
//! ## Non-finite Floats
//!
//! Lifetimes may be infinite. See [`codec`] for how such values are kept
//! out of plain JSON numbers.

pub mod codec;
pub mod file_store;

pub use file_store::FileStore;
