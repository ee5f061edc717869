// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The three ingested series and their fixed mappings.

use crate::mapping::{normalize_kp, CanonicalPoint, FieldMapper};
use crate::observation::RawObservation;
use serde::Serialize;
use std::fmt;

const WIND_FIELDS: &[(&str, &str)] = &[
    ("speed_kms", "proton_speed"),
    ("density_cm3", "proton_density"),
    ("temperature_k", "proton_temperature"),
];

const MAG_FIELDS: &[(&str, &str)] = &[
    ("bt_nt", "bt"),
    ("bx_gsm_nt", "bx_gsm"),
    ("by_gsm_nt", "by_gsm"),
    ("bz_gsm_nt", "bz_gsm"),
];

/// Source fields copied as tags on the real-time solar wind series.
const RTSW_TAGS: &[&str] = &["source"];

/// A feed series. Declaration order is batch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Series {
    /// Planetary K index.
    Kp,
    /// Solar wind plasma.
    Wind,
    /// Interplanetary magnetic field.
    Mag,
}

impl Series {
    /// All series in batch order.
    pub const ALL: [Series; 3] = [Series::Kp, Series::Wind, Series::Mag];

    /// Short name used in logs and outcomes.
    pub fn name(self) -> &'static str {
        match self {
            Series::Kp => "kp",
            Series::Wind => "wind",
            Series::Mag => "mag",
        }
    }

    /// Line Protocol measurement.
    pub fn measurement(self) -> &'static str {
        match self {
            Series::Kp => "spaceweather_kp",
            Series::Wind => "spaceweather_solar_wind",
            Series::Mag => "spaceweather_imf",
        }
    }

    /// Tags written on every line of this series.
    pub fn fixed_tags(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Series::Kp => &[("source", "noaa")],
            Series::Wind | Series::Mag => &[],
        }
    }

    /// Normalize sliced rows into canonical points.
    pub fn normalize(self, rows: &[RawObservation]) -> Vec<CanonicalPoint> {
        match self {
            Series::Kp => normalize_kp(rows),
            Series::Wind => FieldMapper::new(WIND_FIELDS, RTSW_TAGS).normalize(rows),
            Series::Mag => FieldMapper::new(MAG_FIELDS, RTSW_TAGS).normalize(rows),
        }
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
