//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Returns negative duration if other is after self.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Returns whole seconds elapsed from another timestamp to this one.
    pub fn seconds_since(&self, other: &Timestamp) -> i64 {
        self.duration_since(other).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_is_ordered() {
        let a = Timestamp::now();
        let b = Timestamp::from_datetime(*a.as_datetime() + Duration::seconds(5));
        assert!(a.is_before(&b));
        assert!(b.is_after(&a));
    }

    #[test]
    fn seconds_since_measures_elapsed_time() {
        let a = Timestamp::now();
        let b = Timestamp::from_datetime(*a.as_datetime() + Duration::seconds(90));
        assert_eq!(b.seconds_since(&a), 90);
        assert_eq!(a.seconds_since(&b), -90);
    }

    #[test]
    fn serializes_transparently() {
        let ts = Timestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(ts, back);
    }
}
