// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Raw record mapping to canonical points.
//!
//! Maps feed rows to named numeric fields and string tags based on a
//! declarative `(canonical name, source name)` table.

use crate::observation::RawObservation;
use std::collections::BTreeMap;

/// Tag value used when a row lacks the tag's source field.
pub const UNKNOWN_TAG: &str = "unknown";

/// A normalized observation ready for encoding.
///
/// Always holds at least one finite field; see [`CanonicalPoint::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPoint {
    timestamp_ms: i64,
    fields: Vec<(String, f64)>,
    tags: BTreeMap<String, String>,
}

impl CanonicalPoint {
    /// Build a point. Non-finite fields are discarded; returns `None` when
    /// nothing is left.
    pub fn new(
        timestamp_ms: i64,
        fields: Vec<(String, f64)>,
        tags: BTreeMap<String, String>,
    ) -> Option<Self> {
        let fields: Vec<_> = fields.into_iter().filter(|(_, v)| v.is_finite()).collect();
        if fields.is_empty() {
            return None;
        }
        Some(Self {
            timestamp_ms,
            fields,
            tags,
        })
    }

    /// Observation time in Unix milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    /// Numeric fields in mapping order.
    pub fn fields(&self) -> &[(String, f64)] {
        &self.fields
    }

    /// Tags copied from the source row.
    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }
}

/// Maps raw rows to canonical points.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    /// `(canonical name, source name)` pairs.
    field_map: Vec<(String, String)>,
    /// Source fields copied verbatim as tags.
    tag_keys: Vec<String>,
}

impl FieldMapper {
    /// Create a mapper from a field table and tag key list.
    pub fn new(field_map: &[(&str, &str)], tag_keys: &[&str]) -> Self {
        Self {
            field_map: field_map
                .iter()
                .map(|(c, s)| (c.to_string(), s.to_string()))
                .collect(),
            tag_keys: tag_keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Map one row. `None` if the timestamp is invalid or no field survives.
    pub fn map_row(&self, row: &RawObservation) -> Option<CanonicalPoint> {
        let ts = row.timestamp_ms()?;
        let fields = self
            .field_map
            .iter()
            .filter_map(|(canonical, source)| row.number(source).map(|v| (canonical.clone(), v)))
            .collect();
        CanonicalPoint::new(ts, fields, self.tags_for(row))
    }

    /// Map every row, preserving input order.
    pub fn normalize(&self, rows: &[RawObservation]) -> Vec<CanonicalPoint> {
        rows.iter().filter_map(|r| self.map_row(r)).collect()
    }

    fn tags_for(&self, row: &RawObservation) -> BTreeMap<String, String> {
        self.tag_keys
            .iter()
            .map(|key| {
                let value = row
                    .get(key)
                    .and_then(|v| v.as_tag())
                    .unwrap_or_else(|| UNKNOWN_TAG.to_string());
                (key.clone(), value)
            })
            .collect()
    }
}

/// Normalize rows with an ad hoc field table.
pub fn normalize(
    rows: &[RawObservation],
    field_map: &[(&str, &str)],
    tag_keys: &[&str],
) -> Vec<CanonicalPoint> {
    FieldMapper::new(field_map, tag_keys).normalize(rows)
}

/// Extract the planetary K index.
///
/// Feed variants disagree on the field name: `kp` is preferred, `kp_index`
/// is used when `kp` is missing or not numeric (e.g. `"3M"`).
pub fn normalize_kp(rows: &[RawObservation]) -> Vec<CanonicalPoint> {
    rows.iter()
        .filter_map(|row| {
            let ts = row.timestamp_ms()?;
            let kp = row.number("kp").or_else(|| row.number("kp_index"))?;
            CanonicalPoint::new(ts, vec![("kp".to_string(), kp)], BTreeMap::new())
        })
        .collect()
}
