//! Strategy configuration for timestamps, binary blobs and absent fields.
//!
//! Strategies are plain values. An [`Encoder`](crate::Encoder) or
//! [`Decoder`](crate::Decoder) holds them in an immutable snapshot
//! ([`EncodeConfig`] / [`DecodeConfig`]) that every call clones up front.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use dictionary_value::{Timestamp, ValueMap, REFERENCE_EPOCH_UNIX_OFFSET};

use crate::decoder::SingleValueDecoder;
use crate::encoder::SingleValueEncoder;
use crate::error::{DecodeResult, EncodeResult};

/// Custom timestamp encoding hook.
pub type DateEncodeFn =
    Arc<dyn Fn(&Timestamp, &mut SingleValueEncoder) -> EncodeResult<()> + Send + Sync>;
/// Custom timestamp decoding hook.
pub type DateDecodeFn =
    Arc<dyn Fn(&SingleValueDecoder<'_>) -> DecodeResult<Timestamp> + Send + Sync>;
/// Custom blob encoding hook.
pub type DataEncodeFn =
    Arc<dyn Fn(&[u8], &mut SingleValueEncoder) -> EncodeResult<()> + Send + Sync>;
/// Custom blob decoding hook.
pub type DataDecodeFn =
    Arc<dyn Fn(&SingleValueDecoder<'_>) -> DecodeResult<Vec<u8>> + Send + Sync>;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// How [`Timestamp`] values are written and read.
#[derive(Clone, Default)]
pub enum DateStrategy {
    /// Floating-point seconds from the reference epoch (2001-01-01).
    #[default]
    DeferredToNative,
    /// Floating-point seconds from the Unix epoch.
    SecondsSince1970,
    /// Floating-point milliseconds from the Unix epoch.
    MillisecondsSince1970,
    /// `YYYY-MM-DDTHH:MM:SSZ`, UTC, truncated to whole seconds.
    Iso8601,
    /// Delegates to an injected formatter.
    Formatted(Arc<dyn DateFormatter>),
    /// Fully delegates to caller-supplied functions.
    Custom {
        encode: DateEncodeFn,
        decode: DateDecodeFn,
    },
}

impl DateStrategy {
    /// Builds a [`DateStrategy::Custom`] from two closures.
    pub fn custom<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&Timestamp, &mut SingleValueEncoder) -> EncodeResult<()> + Send + Sync + 'static,
        D: Fn(&SingleValueDecoder<'_>) -> DecodeResult<Timestamp> + Send + Sync + 'static,
    {
        DateStrategy::Custom {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Builds a [`DateStrategy::Formatted`] from a chrono strftime pattern.
    pub fn formatted(pattern: impl Into<String>) -> Self {
        DateStrategy::Formatted(Arc::new(PatternFormatter::new(pattern)))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DateStrategy::DeferredToNative => "deferredToNative",
            DateStrategy::SecondsSince1970 => "secondsSince1970",
            DateStrategy::MillisecondsSince1970 => "millisecondsSince1970",
            DateStrategy::Iso8601 => "iso8601",
            DateStrategy::Formatted(_) => "formatted",
            DateStrategy::Custom { .. } => "custom",
        }
    }
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateStrategy::Formatted(formatter) => {
                f.debug_tuple("Formatted").field(&formatter.describe()).finish()
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Injected textual timestamp formatter.
pub trait DateFormatter: Send + Sync {
    /// Renders `timestamp`; `None` when it cannot be represented.
    fn format(&self, timestamp: &Timestamp) -> Option<String>;

    /// Parses text produced by [`format`](Self::format).
    fn parse(&self, text: &str) -> Option<Timestamp>;

    fn describe(&self) -> String {
        "formatter".to_owned()
    }
}

/// A [`DateFormatter`] driven by a chrono strftime pattern, always in UTC.
///
/// Parsing tries a full date-time with offset, then a naive date-time, then a
/// bare date at midnight. Patterns without a year (`"%B %-d"`) format fine
/// but cannot be parsed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternFormatter {
    pattern: String,
}

impl PatternFormatter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl DateFormatter for PatternFormatter {
    fn format(&self, timestamp: &Timestamp) -> Option<String> {
        let datetime = timestamp.to_datetime()?;
        let mut out = String::new();
        // chrono reports bad patterns as fmt::Error rather than panicking here.
        write!(out, "{}", datetime.format(&self.pattern)).ok()?;
        Some(out)
    }

    fn parse(&self, text: &str) -> Option<Timestamp> {
        if let Ok(datetime) = DateTime::parse_from_str(text, &self.pattern) {
            return Some(Timestamp::from_datetime(datetime.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, &self.pattern) {
            return Some(Timestamp::from_datetime(naive.and_utc()));
        }
        let date = NaiveDate::parse_from_str(text, &self.pattern).ok()?;
        Some(Timestamp::from_datetime(date.and_hms_opt(0, 0, 0)?.and_utc()))
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }
}

/// ISO 8601 text for `timestamp`, truncated to whole seconds.
pub fn format_iso8601(timestamp: &Timestamp) -> Option<String> {
    let whole = timestamp.reference_seconds().floor();
    if !whole.is_finite() {
        return None;
    }
    let unix = (whole as i64).checked_add(REFERENCE_EPOCH_UNIX_OFFSET as i64)?;
    let datetime = DateTime::from_timestamp(unix, 0)?;
    Some(datetime.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Parses RFC 3339 text; fractional seconds and any offset are accepted.
pub fn parse_iso8601(text: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| Timestamp::from_datetime(datetime.with_timezone(&Utc)))
}

// ---------------------------------------------------------------------------
// Binary data
// ---------------------------------------------------------------------------

/// How byte blobs are written.
///
/// Decoding a blob ignores this unless it is [`DataStrategy::Custom`].
#[derive(Clone, Default)]
pub enum DataStrategy {
    /// An array of unsigned 8-bit integers.
    DeferredToNative,
    /// Standard-alphabet base64 with padding.
    #[default]
    Base64,
    Custom {
        encode: DataEncodeFn,
        decode: DataDecodeFn,
    },
}

impl DataStrategy {
    pub fn custom<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&[u8], &mut SingleValueEncoder) -> EncodeResult<()> + Send + Sync + 'static,
        D: Fn(&SingleValueDecoder<'_>) -> DecodeResult<Vec<u8>> + Send + Sync + 'static,
    {
        DataStrategy::Custom {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataStrategy::DeferredToNative => "deferredToNative",
            DataStrategy::Base64 => "base64",
            DataStrategy::Custom { .. } => "custom",
        }
    }
}

impl fmt::Debug for DataStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Missing values
// ---------------------------------------------------------------------------

/// What the decoder does when a struct field has no key in the input.
///
/// `Option` fields always decode to `None`, whatever the strategy.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MissingValueStrategy {
    #[default]
    FailOnMissing,
    /// Substitute the target type's zero value.
    UseStandardDefault,
    /// Substitute `defaults[type name]`, else the zero value.
    UseDefault(ValueMap),
}

impl MissingValueStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            MissingValueStrategy::FailOnMissing => "failOnMissing",
            MissingValueStrategy::UseStandardDefault => "useStandardDefault",
            MissingValueStrategy::UseDefault(_) => "useDefault",
        }
    }

    pub(crate) fn is_permissive(&self) -> bool {
        !matches!(self, MissingValueStrategy::FailOnMissing)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Strategy snapshot for one encode call.
#[derive(Debug, Clone, Default)]
pub struct EncodeConfig {
    pub date: DateStrategy,
    pub data: DataStrategy,
}

/// Strategy snapshot for one decode call.
#[derive(Debug, Clone, Default)]
pub struct DecodeConfig {
    pub date: DateStrategy,
    pub data: DataStrategy,
    pub missing: MissingValueStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Timestamp {
        Timestamp::from_unix_seconds(978_430_656.789)
    }

    #[test]
    fn iso8601_truncates_to_seconds() {
        assert_eq!(
            format_iso8601(&sample()).as_deref(),
            Some("2001-01-02T10:17:36Z")
        );
        assert_eq!(format_iso8601(&Timestamp::from_reference_seconds(f64::NAN)), None);
        assert_eq!(format_iso8601(&Timestamp::from_reference_seconds(f64::INFINITY)), None);
    }

    #[test]
    fn iso8601_never_rounds_into_the_next_second() {
        let stamp = Timestamp::from_reference_seconds(123_456.999_999_999_9);
        assert_eq!(
            format_iso8601(&stamp).as_deref(),
            Some("2001-01-02T10:17:36Z")
        );
        let before_epoch = Timestamp::from_unix_seconds(-0.25);
        assert_eq!(
            format_iso8601(&before_epoch).as_deref(),
            Some("1969-12-31T23:59:59Z")
        );
    }

    #[test]
    fn iso8601_parse_accepts_fraction_and_offset() {
        let plain = parse_iso8601("2001-01-02T10:17:36Z").unwrap();
        assert_eq!(plain.unix_seconds(), 978_430_656.0);
        let fractional = parse_iso8601("2001-01-02T10:17:36.5Z").unwrap();
        assert_eq!(fractional.unix_seconds(), 978_430_656.5);
        let offset = parse_iso8601("2001-01-02T11:17:36+01:00").unwrap();
        assert_eq!(offset.unix_seconds(), 978_430_656.0);
        assert!(parse_iso8601("yesterday").is_none());
    }

    #[test]
    fn pattern_formatter() {
        let month_day = PatternFormatter::new("%B %-d");
        assert_eq!(month_day.format(&sample()).as_deref(), Some("January 2"));
        assert!(month_day.parse("January 2").is_none());

        let full = PatternFormatter::new("%Y-%m-%d %H:%M:%S");
        let text = full.format(&sample()).unwrap();
        assert_eq!(text, "2001-01-02 10:17:36");
        assert_eq!(full.parse(&text).unwrap().unix_seconds(), 978_430_656.0);

        let date_only = PatternFormatter::new("%Y-%m-%d");
        assert_eq!(
            date_only.parse("2001-01-02").unwrap().unix_seconds(),
            978_393_600.0
        );
    }

    #[test]
    fn defaults() {
        let encode = EncodeConfig::default();
        assert_eq!(encode.date.name(), "deferredToNative");
        assert_eq!(encode.data.name(), "base64");
        let decode = DecodeConfig::default();
        assert_eq!(decode.missing, MissingValueStrategy::FailOnMissing);
        assert!(!decode.missing.is_permissive());
        assert_eq!(format!("{:?}", DateStrategy::formatted("%Y")), "Formatted(\"%Y\")");
    }
}
