use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

/// Reserved newtype-struct name identifying a [`Timestamp`] to the engine.
pub const TIMESTAMP_TOKEN: &str = "$__dictionary_coding_private_Timestamp";

/// Seconds between the Unix epoch and the reference epoch (2001-01-01T00:00:00Z).
pub const REFERENCE_EPOCH_UNIX_OFFSET: f64 = 978_307_200.0;

/// A point in time, stored as fractional seconds from the reference epoch
/// 2001-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// The reference epoch itself.
    pub const REFERENCE: Timestamp = Timestamp { seconds: 0.0 };

    pub fn from_reference_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn from_unix_seconds(seconds: f64) -> Self {
        Self {
            seconds: seconds - REFERENCE_EPOCH_UNIX_OFFSET,
        }
    }

    pub fn from_unix_millis(millis: f64) -> Self {
        Self::from_unix_seconds(millis / 1000.0)
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let whole = datetime.timestamp() as f64;
        let fraction = datetime.timestamp_subsec_nanos() as f64 / 1_000_000_000.0;
        Self::from_unix_seconds(whole + fraction)
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Seconds since the reference epoch.
    pub fn reference_seconds(&self) -> f64 {
        self.seconds
    }

    pub fn unix_seconds(&self) -> f64 {
        self.seconds + REFERENCE_EPOCH_UNIX_OFFSET
    }

    pub fn unix_millis(&self) -> f64 {
        1000.0 * self.unix_seconds()
    }

    /// Converts to a chrono UTC datetime with nanosecond precision.
    ///
    /// Returns `None` for non-finite or out-of-range timestamps.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let unix = self.unix_seconds();
        if !unix.is_finite() {
            return None;
        }
        let mut whole = unix.floor();
        let mut nanos = ((unix - whole) * 1_000_000_000.0).round();
        if nanos >= 1_000_000_000.0 {
            whole += 1.0;
            nanos = 0.0;
        }
        if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return None;
        }
        DateTime::from_timestamp(whole as i64, nanos as u32)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(datetime: DateTime<Utc>) -> Self {
        Self::from_datetime(datetime)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(TIMESTAMP_TOKEN, &self.seconds)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds since the reference epoch")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Timestamp, E> {
        Ok(Timestamp::from_reference_seconds(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Timestamp, E> {
        Ok(Timestamp::from_reference_seconds(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Timestamp, E> {
        Ok(Timestamp::from_reference_seconds(v as f64))
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Timestamp, D::Error> {
        f64::deserialize(deserializer).map(Timestamp::from_reference_seconds)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(TIMESTAMP_TOKEN, TimestampVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_and_reference_offsets() {
        let ts = Timestamp::from_reference_seconds(123_456.789);
        assert!((ts.unix_seconds() - 978_430_656.789).abs() < 1e-6);
        assert!((ts.unix_millis() - 978_430_656_789.0).abs() < 1e-3);
        let back = Timestamp::from_unix_seconds(ts.unix_seconds());
        assert!((back.reference_seconds() - 123_456.789).abs() < 1e-6);
    }

    #[test]
    fn datetime_conversion() {
        let ts = Timestamp::from_reference_seconds(123_456.789);
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.format("%Y-%m-%dT%H:%M:%S").to_string(), "2001-01-02T10:17:36");
        assert_eq!(dt.timestamp_subsec_millis(), 789);
        let back = Timestamp::from_datetime(dt);
        assert!((back.reference_seconds() - 123_456.789).abs() < 1e-6);
    }

    #[test]
    fn non_finite_has_no_datetime() {
        assert!(Timestamp::from_reference_seconds(f64::NAN)
            .to_datetime()
            .is_none());
        assert!(Timestamp::from_reference_seconds(f64::INFINITY)
            .to_datetime()
            .is_none());
    }

    #[test]
    fn serde_json_sees_reference_seconds() {
        let ts = Timestamp::from_reference_seconds(42.5);
        assert_eq!(serde_json::to_value(ts).unwrap(), serde_json::json!(42.5));
        let back: Timestamp = serde_json::from_value(serde_json::json!(42.5)).unwrap();
        assert_eq!(back, ts);
    }
}
