// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Incremental window selection.
//!
//! Picks the rows of a feed snapshot that a run still has to deliver:
//! anything strictly newer than `watermark - OVERLAP`, each raw timestamp
//! once, in ascending time order.
//!
//! The overlap re-reads the last ten minutes on every run so records that
//! upstream publishes late or revises are not skipped. The sink receives
//! those points again and is expected to overwrite them.

use crate::observation::RawObservation;
use std::collections::HashSet;

/// Backward extension of the window past the last watermark (10 minutes).
pub const OVERLAP_MS: i64 = 10 * 60 * 1000;

/// Lower bound for a series: rows at or before it are already delivered.
///
/// The bootstrap bound only applies when the series has no watermark.
pub fn cutoff(prior_watermark_ms: Option<i64>, bootstrap_since_ms: Option<i64>) -> Option<i64> {
    match prior_watermark_ms {
        Some(wm) => Some(wm.saturating_sub(OVERLAP_MS)),
        None => bootstrap_since_ms,
    }
}

/// Rows newer than the cutoff, deduplicated by raw `time_tag`, oldest first.
///
/// Two different strings that parse to the same instant are both kept;
/// repeats of the same string collapse to the first occurrence.
pub fn slice_new(
    rows: &[RawObservation],
    prior_watermark_ms: Option<i64>,
    bootstrap_since_ms: Option<i64>,
) -> Vec<RawObservation> {
    let cutoff = cutoff(prior_watermark_ms, bootstrap_since_ms);
    let mut seen = HashSet::new();

    let mut fresh: Vec<(i64, &RawObservation)> = rows
        .iter()
        .filter_map(|row| row.timestamp_ms().map(|ts| (ts, row)))
        .filter(|(ts, _)| cutoff.map_or(true, |c| *ts > c))
        .filter(|(_, row)| seen.insert(row.time_tag.as_str()))
        .collect();

    fresh.sort_by_key(|(ts, _)| *ts);
    fresh.into_iter().map(|(_, row)| row.clone()).collect()
}

/// Latest parsed timestamp among sliced rows.
pub fn latest_timestamp(rows: &[RawObservation]) -> Option<i64> {
    rows.iter().filter_map(RawObservation::timestamp_ms).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::RawScalar;

    fn row(tag: &str, v: f64) -> RawObservation {
        RawObservation::new(tag, [("v", RawScalar::Number(v))])
    }

    fn tags(rows: &[RawObservation]) -> Vec<&str> {
        rows.iter().map(|r| r.time_tag.as_str()).collect()
    }

    #[test]
    fn test_no_bound_keeps_everything_valid() {
        let rows = vec![
            row("2024-03-01T00:02:00Z", 1.0),
            row("garbage", 2.0),
            row("2024-03-01T00:01:00Z", 3.0),
        ];
        let out = slice_new(&rows, None, None);
        assert_eq!(tags(&out), vec!["2024-03-01T00:01:00Z", "2024-03-01T00:02:00Z"]);
    }

    #[test]
    fn test_overlap_reincludes_recent_rows() {
        // watermark at 00:30, cutoff at 00:20
        let wm = crate::coerce::parse_timestamp("2024-03-01T00:30:00Z");
        let rows = vec![
            row("2024-03-01T00:19:00Z", 1.0),
            row("2024-03-01T00:20:00Z", 2.0),
            row("2024-03-01T00:25:00Z", 3.0),
            row("2024-03-01T00:30:00Z", 4.0),
            row("2024-03-01T00:31:00Z", 5.0),
        ];
        let out = slice_new(&rows, wm, None);
        assert_eq!(
            tags(&out),
            vec![
                "2024-03-01T00:25:00Z",
                "2024-03-01T00:30:00Z",
                "2024-03-01T00:31:00Z"
            ]
        );
    }

    #[test]
    fn test_small_watermark_scenario() {
        // wind = 1000 ms, cutoff = -599000 ms
        let inside = RawObservation::new("1970-01-01T00:00:01Z", [("v", RawScalar::Number(1.0))]);
        let outside = RawObservation::new("1969-12-31T23:48:20Z", [("v", RawScalar::Number(2.0))]);
        assert_eq!(inside.timestamp_ms(), Some(1_000));
        assert_eq!(outside.timestamp_ms(), Some(-700_000));

        let out = slice_new(&[inside.clone(), outside], Some(1_000), None);
        assert_eq!(out, vec![inside]);
    }

    #[test]
    fn test_dedup_by_raw_string() {
        let rows = vec![
            row("2024-03-01T00:01:00Z", 1.0),
            row("2024-03-01T00:01:00Z", 2.0),
            row("2024-03-01 00:01:00.000", 3.0),
        ];
        let out = slice_new(&rows, None, None);
        assert_eq!(out.len(), 2);
        // first occurrence of the repeated string wins
        assert_eq!(out[0].number("v"), Some(1.0));
        assert_eq!(out[1].time_tag, "2024-03-01 00:01:00.000");
    }

    #[test]
    fn test_output_sorted_ascending() {
        let rows = vec![
            row("2024-03-01T00:03:00Z", 0.0),
            row("2024-03-01T00:01:00Z", 0.0),
            row("2024-03-01T00:02:00Z", 0.0),
            row("2024-02-29T23:59:00Z", 0.0),
        ];
        let out = slice_new(&rows, None, None);
        let ts: Vec<i64> = out.iter().filter_map(|r| r.timestamp_ms()).collect();
        assert!(ts.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ts.len(), 4);
    }

    #[test]
    fn test_bootstrap_bound_only_without_watermark() {
        let since = crate::coerce::parse_timestamp("2024-03-01T00:00:00Z");
        let rows = vec![row("2024-02-29T23:00:00Z", 1.0), row("2024-03-01T01:00:00Z", 2.0)];

        let cold = slice_new(&rows, None, since);
        assert_eq!(tags(&cold), vec!["2024-03-01T01:00:00Z"]);

        // a watermark takes precedence over the bootstrap bound
        let wm = crate::coerce::parse_timestamp("2024-02-29T22:00:00Z");
        let warm = slice_new(&rows, wm, since);
        assert_eq!(warm.len(), 2);
    }

    #[test]
    fn test_cutoff_is_strict() {
        let rows = vec![row("2024-03-01T00:00:00Z", 1.0)];
        let ts = rows[0].timestamp_ms();
        assert!(slice_new(&rows, None, ts).is_empty());
    }

    #[test]
    fn test_latest_timestamp() {
        let rows = vec![row("2024-03-01T00:03:00Z", 0.0), row("2024-03-01T00:01:00Z", 0.0)];
        assert_eq!(
            latest_timestamp(&rows),
            crate::coerce::parse_timestamp("2024-03-01T00:03:00Z")
        );
        assert_eq!(latest_timestamp(&[]), None);
    }
}
