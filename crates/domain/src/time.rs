//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_event_at`, history entries, snapshots.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time, truncated to whole seconds.
///
/// The store keeps unix seconds, so sub-second precision would never
/// survive a round trip and would break change detection.
#[must_use]
pub fn now() -> Timestamp {
    from_unix(Utc::now().timestamp())
}

/// Convert unix seconds into a [`Timestamp`], falling back to the epoch for
/// out-of-range values.
#[must_use]
pub fn from_unix(secs: i64) -> Timestamp {
    DateTime::from_timestamp(secs, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a [`Timestamp`] into unix seconds.
#[must_use]
pub fn to_unix(ts: Timestamp) -> i64 {
    ts.timestamp()
}
