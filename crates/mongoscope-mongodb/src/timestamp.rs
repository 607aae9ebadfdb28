//! Timestamps embedded in identifiers and logical clocks

use bson::{oid::ObjectId, Bson, DateTime, Timestamp};
use chrono::SecondsFormat;

/// A value that carries a wall-clock time inside it
///
/// `ObjectId`s encode their creation second in the first four bytes, and oplog
/// `Timestamp`s carry seconds since the epoch in their `time` component. Both
/// last-update lookups go through this trait so neither depends on the
/// identifier format of the other.
pub trait HasEmbeddedTimestamp {
    /// The embedded time, or `None` if this value does not carry one
    fn embedded_timestamp(&self) -> Option<DateTime>;
}

impl HasEmbeddedTimestamp for ObjectId {
    fn embedded_timestamp(&self) -> Option<DateTime> {
        Some(self.timestamp())
    }
}

impl HasEmbeddedTimestamp for Timestamp {
    fn embedded_timestamp(&self) -> Option<DateTime> {
        Some(DateTime::from_millis(i64::from(self.time) * 1000))
    }
}

impl HasEmbeddedTimestamp for DateTime {
    fn embedded_timestamp(&self) -> Option<DateTime> {
        Some(*self)
    }
}

impl HasEmbeddedTimestamp for Bson {
    fn embedded_timestamp(&self) -> Option<DateTime> {
        match self {
            Bson::ObjectId(oid) => oid.embedded_timestamp(),
            Bson::Timestamp(ts) => ts.embedded_timestamp(),
            Bson::DateTime(dt) => dt.embedded_timestamp(),
            _ => None,
        }
    }
}

/// Render a BSON datetime as ISO-8601 UTC with millisecond precision
///
/// e.g. `2024-01-02T03:04:05.000Z`
pub fn to_iso_string(datetime: DateTime) -> String {
    datetime
        .to_chrono()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
