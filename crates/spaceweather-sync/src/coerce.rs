// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timestamp and numeric coercion for raw feed values.
//!
//! Feed records carry timestamps in several calendar layouts and numbers as
//! either JSON numbers or text. Everything here returns `None` instead of
//! failing: a value that cannot be coerced is simply absent.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

/// Layouts with an explicit offset (`+0000`, `+00:00`), tried after
/// RFC 3339 and RFC 2822.
const ZONED_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Naive layouts, interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a feed timestamp into Unix milliseconds.
///
/// Returns `None` for unparseable input and for the epoch itself.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let ms = if let Some(dt) = parse_zoned(raw) {
        dt.timestamp_millis()
    } else if let Some(naive) = parse_naive(raw) {
        naive.and_utc().timestamp_millis()
    } else {
        return None;
    };

    (ms != 0).then_some(ms)
}

fn parse_zoned(raw: &str) -> Option<DateTime<FixedOffset>> {
    let standard = DateTime::parse_from_rfc3339(raw).or_else(|_| DateTime::parse_from_rfc2822(raw));
    if let Ok(dt) = standard {
        return Some(dt);
    }
    // `%z` wants a numeric offset
    let raw = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(base) => format!("{}+0000", base),
        None => raw.to_string(),
    };
    ZONED_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(&raw, layout).ok())
}

fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerce numeric text into a finite float.
///
/// `""`, `"null"` and `"nan"` (any case) are never numbers; anything else is
/// run through the standard float parser and must come out finite.
pub fn text_to_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Finite check for values that arrived as native numbers.
pub fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
