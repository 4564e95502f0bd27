//! Serde helpers for values JSON cannot carry natively.
//!
//! JSON has no representation for infinite or NaN floats, and `serde_json`
//! silently writes them as `null`. Story lifetimes are routinely infinite, so
//! float fields that may hold those values are written as string tokens:
//!
//! ```json
//! { "lifetime": "positiveInfinity" }
//! ```
//!
//! Finite values stay plain numbers. Timestamps are `chrono::DateTime<Utc>`,
//! which serde already writes as ISO-8601 strings.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serializer};

pub const POSITIVE_INFINITY: &str = "positiveInfinity";
pub const NEGATIVE_INFINITY: &str = "negativeInfinity";
pub const NAN: &str = "nan";

#[derive(Deserialize)]
#[serde(untagged)]
enum FloatRepr {
    Number(f64),
    Token(String),
}

fn token_for(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some(NAN)
    } else if value == f64::INFINITY {
        Some(POSITIVE_INFINITY)
    } else if value == f64::NEG_INFINITY {
        Some(NEGATIVE_INFINITY)
    } else {
        None
    }
}

fn from_repr<E: de::Error>(repr: FloatRepr) -> Result<f64, E> {
    match repr {
        FloatRepr::Number(n) => Ok(n),
        FloatRepr::Token(token) => match token.as_str() {
            POSITIVE_INFINITY => Ok(f64::INFINITY),
            NEGATIVE_INFINITY => Ok(f64::NEG_INFINITY),
            NAN => Ok(f64::NAN),
            other => Err(E::custom(format!("unexpected float token: {other}"))),
        },
    }
}

/// `#[serde(with = "sentinel_f64")]` for `f64` fields.
pub mod sentinel_f64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        match token_for(*value) {
            Some(token) => serializer.serialize_str(token),
            None => serializer.serialize_f64(*value),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        from_repr(FloatRepr::deserialize(deserializer)?)
    }
}

/// `#[serde(default, with = "sentinel_f64_opt")]` for `Option<f64>` fields.
pub mod sentinel_f64_opt {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => sentinel_f64::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<FloatRepr>::deserialize(deserializer)?
            .map(from_repr::<D::Error>)
            .transpose()
    }
}

/// Treats a missing, `null` or empty URL string as absent.
pub fn empty_string_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
