// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Line Protocol encoding.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! Points carry millisecond timestamps; lines carry nanoseconds.
//!
//! See: <https://docs.influxdata.com/influxdb/v2/reference/syntax/line-protocol/>

use crate::mapping::CanonicalPoint;
use std::collections::BTreeMap;

/// Nanoseconds per millisecond.
const NS_PER_MS: i128 = 1_000_000;

/// Encode one point as a Line Protocol line.
///
/// Tags are written in key order. Non-finite fields are skipped; if none
/// remain the point has no line and `None` is returned.
pub fn encode(
    measurement: &str,
    tags: &BTreeMap<String, String>,
    fields: &[(String, f64)],
    timestamp_ms: i64,
) -> Option<String> {
    let field_section = fields
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(k, v)| format!("{}={}", escape_tag(k), format_float(*v)))
        .collect::<Vec<_>>()
        .join(",");
    if field_section.is_empty() {
        return None;
    }

    let mut line = escape_measurement(measurement);
    for (key, value) in tags {
        line.push(',');
        line.push_str(&escape_tag(key));
        line.push('=');
        line.push_str(&escape_tag(value));
    }

    line.push(' ');
    line.push_str(&field_section);
    line.push(' ');
    line.push_str(&ms_to_ns(timestamp_ms).to_string());

    Some(line)
}

/// Encode a canonical point under a series measurement.
///
/// `fixed_tags` are added to the point's own tags; on key collision the
/// fixed tag wins.
pub fn encode_point(
    measurement: &str,
    fixed_tags: &[(&str, &str)],
    point: &CanonicalPoint,
) -> Option<String> {
    let mut tags = point.tags().clone();
    for (k, v) in fixed_tags {
        tags.insert(k.to_string(), v.to_string());
    }
    encode(measurement, &tags, point.fields(), point.timestamp_ms())
}

/// Convert milliseconds to nanoseconds without going through floats.
pub fn ms_to_ns(timestamp_ms: i64) -> i128 {
    i128::from(timestamp_ms) * NS_PER_MS
}

/// Shortest representation that parses back to the same `f64`.
fn format_float(v: f64) -> String {
    format!("{}", v)
}

/// Escape a measurement name: backslash, comma, space.
///
/// Backslash is handled first so escapes added afterwards are not doubled.
pub fn escape_measurement(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | ',' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a tag key, tag value or field key: backslash, comma, space, equals.
pub fn escape_tag(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | ',' | ' ' | '=') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
