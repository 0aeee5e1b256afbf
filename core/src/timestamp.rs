//! Epoch-millisecond timestamps.
//!
//! Stored records may carry a creation time either as a raw integer
//! (milliseconds since the Unix epoch) or as a provider timestamp object
//! `{ "seconds": .., "nanoseconds": .. }`. Both shapes are normalized into
//! [`EpochMillis`] when a record is decoded; anything else is rejected. The
//! domain model never sees the provider shape, and records are always written
//! back as plain integers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A point in time as milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EpochMillis(pub i64);

impl EpochMillis {
    /// Wrap a raw millisecond value.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Raw millisecond value.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Convert back to a `chrono` timestamp.
    ///
    /// Returns `None` if the value is outside chrono's representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for EpochMillis {
    fn from(time: DateTime<Utc>) -> Self {
        Self(time.timestamp_millis())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Provider { seconds: i64, nanoseconds: u32 },
}

impl<'de> Deserialize<'de> for EpochMillis {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawTimestamp::deserialize(deserializer) {
            Ok(RawTimestamp::Millis(millis)) => Ok(Self(millis)),
            Ok(RawTimestamp::Provider {
                seconds,
                nanoseconds,
            }) => Ok(Self(
                seconds
                    .saturating_mul(1000)
                    .saturating_add(i64::from(nanoseconds / 1_000_000)),
            )),
            Err(_) => Err(serde::de::Error::custom(
                "timestamp must be epoch milliseconds or {seconds, nanoseconds}",
            )),
        }
    }
}
