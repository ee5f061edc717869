// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw feed records.
//!
//! Upstream rows have no fixed shape. Each row is captured as its `time_tag`
//! string plus a map of scalar values, so later stages ask one question per
//! field: "is it present and finite?"

use crate::coerce;
use serde_json::Value;
use std::collections::BTreeMap;

/// A scalar as it arrived in the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawScalar {
    /// JSON number.
    Number(f64),
    /// JSON string (may hold a number, a sentinel, or anything else).
    Text(String),
    /// JSON bool.
    Bool(bool),
    /// Null, or a nested array/object. Never numeric.
    Null,
}

impl RawScalar {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(RawScalar::Number).unwrap_or(RawScalar::Null),
            Value::String(s) => RawScalar::Text(s.clone()),
            Value::Bool(b) => RawScalar::Bool(*b),
            _ => RawScalar::Null,
        }
    }

    /// The value as a finite float, if it is one.
    pub fn as_finite(&self) -> Option<f64> {
        match self {
            RawScalar::Number(v) => coerce::finite(*v),
            RawScalar::Text(s) => coerce::text_to_number(s),
            RawScalar::Bool(_) | RawScalar::Null => None,
        }
    }

    /// Verbatim text used for tag values.
    pub fn as_tag(&self) -> Option<String> {
        match self {
            RawScalar::Text(s) => Some(s.clone()),
            RawScalar::Number(v) => Some(v.to_string()),
            RawScalar::Bool(b) => Some(b.to_string()),
            RawScalar::Null => None,
        }
    }
}

/// One upstream record.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    /// Raw `time_tag` text; empty when the record had none.
    pub time_tag: String,
    values: BTreeMap<String, RawScalar>,
}

impl RawObservation {
    /// Build a record from a time tag and `(name, scalar)` pairs.
    pub fn new<I, K>(time_tag: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = (K, RawScalar)>,
        K: Into<String>,
    {
        Self {
            time_tag: time_tag.into(),
            values: values.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Convert one JSON object. Non-objects yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let time_tag = match obj.get("time_tag") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };
        let values = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "time_tag")
            .map(|(k, v)| (k.clone(), RawScalar::from_json(v)))
            .collect();
        Some(Self { time_tag, values })
    }

    /// Parsed timestamp in Unix milliseconds.
    pub fn timestamp_ms(&self) -> Option<i64> {
        coerce::parse_timestamp(&self.time_tag)
    }

    /// Raw scalar by field name.
    pub fn get(&self, name: &str) -> Option<&RawScalar> {
        self.values.get(name)
    }

    /// Field value if present and finite.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(RawScalar::as_finite)
    }
}

/// Convert a feed body into records.
///
/// A body that is not an array yields no rows; array elements that are not
/// objects are skipped.
pub fn rows_from_json(body: &Value) -> Vec<RawObservation> {
    match body.as_array() {
        Some(items) => items.iter().filter_map(RawObservation::from_json).collect(),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_from_json_array() {
        let body = json!([
            {"time_tag": "2024-03-01 00:00:00.000", "kp_index": 3, "kp": "3M"},
            {"time_tag": "2024-03-01 00:01:00.000", "kp_index": null}
        ]);
        let rows = rows_from_json(&body);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].time_tag, "2024-03-01 00:00:00.000");
        assert_eq!(rows[0].number("kp_index"), Some(3.0));
        assert_eq!(rows[0].number("kp"), None);
        assert_eq!(rows[1].get("kp_index"), Some(&RawScalar::Null));
    }

    #[test]
    fn test_rows_from_malformed_body_is_empty() {
        assert!(rows_from_json(&json!({"error": "down"})).is_empty());
        assert!(rows_from_json(&json!("nope")).is_empty());
        assert!(rows_from_json(&Value::Null).is_empty());
    }

    #[test]
    fn test_non_object_elements_skipped() {
        let body = json!([1, "x", null, {"time_tag": "2024-03-01T00:00:00Z"}]);
        let rows = rows_from_json(&body);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].timestamp_ms().is_some());
    }

    #[test]
    fn test_missing_or_non_string_time_tag() {
        let row = RawObservation::from_json(&json!({"time_tag": 12345, "bt": 4.2})).unwrap();
        assert_eq!(row.time_tag, "");
        assert_eq!(row.timestamp_ms(), None);
        assert_eq!(row.number("bt"), Some(4.2));
    }

    #[test]
    fn test_numeric_text_and_sentinels() {
        let row = RawObservation::from_json(&json!({
            "time_tag": "2024-03-01T00:00:00Z",
            "a": "412.5",
            "b": "NaN",
            "c": "null",
            "d": "",
            "e": true,
            "f": [1, 2]
        }))
        .unwrap();
        assert_eq!(row.number("a"), Some(412.5));
        for name in ["b", "c", "d", "e", "f", "missing"] {
            assert_eq!(row.number(name), None, "field {}", name);
        }
    }

    #[test]
    fn test_tag_text() {
        assert_eq!(RawScalar::Text("ACE".into()).as_tag(), Some("ACE".into()));
        assert_eq!(RawScalar::Number(2.0).as_tag(), Some("2".into()));
        assert_eq!(RawScalar::Null.as_tag(), None);
    }
}
