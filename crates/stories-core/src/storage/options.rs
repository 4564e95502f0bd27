//! The persisted story record.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Story;
use crate::persistence::codec::sentinel_f64;

/// Lifetime that never expires.
pub const INFINITE_LIFETIME: f64 = f64::INFINITY;

/// A stored story plus its storage metadata.
///
/// `index` is the record's key in the store and never changes. `created_at`
/// is set once at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStoreOptions {
    /// The stored story. Replaced wholesale on update.
    pub story: Story,

    index: String,

    /// Seconds the story stays valid after `created_at`. May be infinite.
    #[serde(with = "sentinel_f64")]
    pub lifetime: f64,

    created_at: DateTime<Utc>,
}

impl StoryStoreOptions {
    /// Wrap `story` in a record created now.
    pub fn new(story: Story, index: impl Into<String>, lifetime: f64) -> Self {
        Self::with_created_at(story, index, lifetime, Utc::now())
    }

    pub fn with_created_at(
        story: Story,
        index: impl Into<String>,
        lifetime: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            story,
            index: index.into(),
            lifetime,
            created_at,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// `created_at + lifetime`, or `None` if the record never expires.
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        expiration_after(self.created_at, self.lifetime)
    }

    /// True once the expiration date is strictly in the past.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.lifetime.is_nan() {
            return false;
        }
        self.expiration_date().is_some_and(|expires| expires < now)
    }

    /// True while `created_at + lifetime` is still in the future.
    ///
    /// `lifetime` overrides the record's own lifetime when given.
    pub fn is_valid_at(&self, now: DateTime<Utc>, lifetime: Option<f64>) -> bool {
        let lifetime = lifetime.unwrap_or(self.lifetime);
        if lifetime.is_nan() {
            return false;
        }
        match expiration_after(self.created_at, lifetime) {
            Some(expires) => expires > now,
            None => true,
        }
    }
}

/// `None` means "never": positive infinity, NaN, or past the representable
/// date range. Negative infinity expires at the earliest representable date.
fn expiration_after(created_at: DateTime<Utc>, lifetime: f64) -> Option<DateTime<Utc>> {
    if lifetime.is_nan() || lifetime == f64::INFINITY {
        return None;
    }
    if lifetime == f64::NEG_INFINITY {
        return Some(DateTime::<Utc>::MIN_UTC);
    }

    // Nanoseconds cover about 292 years; longer lifetimes fall back to millis.
    let nanos = (lifetime * 1e9).round();
    let millis = (lifetime * 1e3).round();
    let delta = if nanos.abs() < i64::MAX as f64 {
        Some(Duration::nanoseconds(nanos as i64))
    } else if millis.abs() < i64::MAX as f64 {
        Duration::try_milliseconds(millis as i64)
    } else {
        None
    };

    match delta.and_then(|d| created_at.checked_add_signed(d)) {
        Some(expires) => Some(expires),
        None if lifetime > 0.0 => None,
        None => Some(DateTime::<Utc>::MIN_UTC),
    }
}
