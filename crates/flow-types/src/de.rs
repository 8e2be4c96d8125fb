//! Lenient deserializers for the backend's native encodings.
//!
//! The backend is a Java service: durations may arrive as plain numbers
//! (milliseconds) or ISO-8601 strings (`PT0.25S`), instants as RFC 3339
//! strings or epoch numbers depending on its JSON settings.

use chrono::{DateTime, TimeZone, Utc};
use serde::de;
use std::fmt;

/// Epoch numbers above this are milliseconds, below are seconds.
const EPOCH_MILLIS_CUTOFF: f64 = 1e11;

/// Deserialize an optional duration into milliseconds.
pub(crate) fn opt_millis<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: de::Deserializer<'de>,
{
    struct MillisVisitor;

    impl<'de> de::Visitor<'de> for MillisVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("milliseconds as a number or an ISO-8601 duration")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: de::Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f64))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if let Ok(n) = v.trim().parse::<f64>() {
                return Ok(Some(n));
            }
            parse_iso_duration_ms(v)
                .map(Some)
                .ok_or_else(|| E::custom(format!("invalid duration: {v}")))
        }
    }

    deserializer.deserialize_any(MillisVisitor)
}

/// Deserialize an optional instant.
pub(crate) fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: de::Deserializer<'de>,
{
    struct TimestampVisitor;

    impl<'de> de::Visitor<'de> for TimestampVisitor {
        type Value = Option<DateTime<Utc>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an RFC 3339 string or epoch number")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: de::Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            epoch_to_utc(v).map(Some).ok_or_else(|| E::custom("epoch out of range"))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            self.visit_f64(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            self.visit_f64(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            DateTime::parse_from_rfc3339(v)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|e| E::custom(format!("invalid timestamp {v}: {e}")))
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

fn epoch_to_utc(v: f64) -> Option<DateTime<Utc>> {
    if !v.is_finite() {
        return None;
    }
    let millis = if v.abs() > EPOCH_MILLIS_CUTOFF {
        v
    } else {
        v * 1000.0
    };
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}

/// Parse `[-]P[nD][T[nH][nM][n.nS]]` into milliseconds.
fn parse_iso_duration_ms(s: &str) -> Option<f64> {
    let s = s.trim();
    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let s = s.strip_prefix('P').or_else(|| s.strip_prefix('p'))?;

    let mut total_ms = 0.0;
    let mut in_time = false;
    let mut number = String::new();
    let mut saw_component = false;

    for c in s.chars() {
        match c {
            'T' | 't' => {
                if !number.is_empty() {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' | '.' | '-' => number.push(c),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                let factor = match (unit.to_ascii_uppercase(), in_time) {
                    ('D', false) => 86_400_000.0,
                    ('H', true) => 3_600_000.0,
                    ('M', true) => 60_000.0,
                    ('S', true) => 1_000.0,
                    _ => return None,
                };
                total_ms += value * factor;
                saw_component = true;
            }
        }
    }

    if !number.is_empty() || !saw_component {
        return None;
    }
    Some(if negative { -total_ms } else { total_ms })
}
