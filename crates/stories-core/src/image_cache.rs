//! Contract with the host's image cache.
//!
//! The storage never loads images itself. It tells the cache which remote
//! images to warm when stories arrive and which to drop when they leave.

/// Host-provided image cache.
///
/// Both calls must be idempotent and must not block on network I/O; failures
/// stay inside the implementation.
pub trait ImageCache: Send + Sync {
    /// Start caching `url` if it isn't cached yet.
    fn warm(&self, url: &str);

    /// Drop `url` from the cache if present.
    fn evict(&self, url: &str);
}

/// Image cache that does nothing. Used when the host has none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopImageCache;

impl ImageCache for NoopImageCache {
    fn warm(&self, _url: &str) {}

    fn evict(&self, _url: &str) {}
}
