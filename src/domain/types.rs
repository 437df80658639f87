//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once by the loader + transformer
//! - borrowed by filtered views without copying
//! - serialized for JSON/CSV exports

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Number of observations in the trailing rolling window.
pub const ROLLING_WINDOW: usize = 7;

/// Default CSV location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/clean/generic_ballot_polls_clean.csv";

/// Normalized survey methodology bucket.
///
/// Free-text methodology labels are mapped onto one of these four buckets by
/// `transform::normalize`. Every record carries exactly one bucket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Methodology {
    Phone,
    Online,
    Panel,
    Unknown,
}

impl Methodology {
    pub const ALL: [Methodology; 4] = [
        Methodology::Phone,
        Methodology::Online,
        Methodology::Panel,
        Methodology::Unknown,
    ];

    /// Lowercase label used in tables, exports and pre-cleaned sources.
    pub fn label(self) -> &'static str {
        match self {
            Methodology::Phone => "phone",
            Methodology::Online => "online",
            Methodology::Panel => "panel",
            Methodology::Unknown => "unknown",
        }
    }

    /// Parse an already-bucketed label (case-insensitive).
    pub fn from_label(s: &str) -> Option<Methodology> {
        let s = s.trim();
        Methodology::ALL
            .into_iter()
            .find(|m| m.label().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Methodology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A party support column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Dem,
    Rep,
}

impl Party {
    pub const ALL: [Party; 2] = [Party::Dem, Party::Rep];

    pub fn label(self) -> &'static str {
        match self {
            Party::Dem => "dem",
            Party::Rep => "rep",
        }
    }

    /// Raw support value for this party on a record.
    pub fn value(self, record: &PollRecord) -> Option<f64> {
        match self {
            Party::Dem => record.dem,
            Party::Rep => record.rep,
        }
    }

    /// Trailing rolling mean for this party on a record.
    pub fn rolling(self, record: &PollRecord) -> Option<f64> {
        match self {
            Party::Dem => record.dem_roll7,
            Party::Rep => record.rep_roll7,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a derived column's values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSource {
    /// Derive the column from the raw inputs.
    #[default]
    Computed,
    /// Read the column verbatim from a pre-cleaned CSV.
    Source,
}

/// Derived column groups that a pre-cleaned source may already contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DerivedColumn {
    /// `margin`.
    Margin,
    /// `dem_roll7`, `rep_roll7`, `margin_roll7`.
    Rolling,
    /// `methodology` already holds bucket labels.
    Methodology,
}

/// Which derived columns are computed vs. taken from the source file.
///
/// The dashboards this pipeline serves differ only in how much cleaning was
/// done upstream; one `DeriveConfig` covers all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeriveConfig {
    pub margin: ColumnSource,
    pub rolling: ColumnSource,
    pub methodology: ColumnSource,
}

impl DeriveConfig {
    /// Build a config that reads the listed column groups from the source.
    pub fn precleaned(columns: &[DerivedColumn]) -> Self {
        let mut config = Self::default();
        for column in columns {
            match column {
                DerivedColumn::Margin => config.margin = ColumnSource::Source,
                DerivedColumn::Rolling => config.rolling = ColumnSource::Source,
                DerivedColumn::Methodology => config.methodology = ColumnSource::Source,
            }
        }
        config
    }
}

/// A raw row of CSV inputs, before any derivation.
///
/// Derived fields (`margin`, `*_roll7`) are only populated when the source
/// file already carries them; whether they are used is up to `DeriveConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRow {
    pub pollster: String,
    pub methodology: Option<String>,
    pub start_date: NaiveDate,

    pub dem: Option<f64>,
    pub rep: Option<f64>,
    pub sample_size: Option<f64>,
    pub predicted_margin: Option<f64>,

    pub margin: Option<f64>,
    pub dem_roll7: Option<f64>,
    pub rep_roll7: Option<f64>,
    pub margin_roll7: Option<f64>,
}

/// One poll row after loading and transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct PollRecord {
    pub pollster: String,
    pub methodology_raw: Option<String>,
    pub methodology: Methodology,
    pub start_date: NaiveDate,

    /// Support values in percentage points.
    pub dem: Option<f64>,
    pub rep: Option<f64>,
    pub sample_size: Option<f64>,

    /// `dem - rep`; `None` if either side is missing.
    pub margin: Option<f64>,

    /// Trailing means over the previous `ROLLING_WINDOW` rows (load order).
    pub dem_roll7: Option<f64>,
    pub rep_roll7: Option<f64>,
    pub margin_roll7: Option<f64>,

    /// Externally supplied, passed through untouched.
    pub predicted_margin: Option<f64>,
}

/// The full, transformed dataset. Never mutated once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PollDataset {
    pub records: Vec<PollRecord>,
    /// Whether the source had a `predicted_margin` column at all.
    pub has_predicted_margin: bool,
    pub source: PathBuf,
    pub rows_read: usize,
}

impl PollDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct pollsters in first-seen order.
    pub fn pollsters(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for r in &self.records {
            if !out.iter().any(|p| p == &r.pollster) {
                out.push(r.pollster.clone());
            }
        }
        out
    }

    /// Distinct methodology buckets in first-seen order.
    pub fn methodologies(&self) -> Vec<Methodology> {
        let mut out = Vec::new();
        for r in &self.records {
            if !out.contains(&r.methodology) {
                out.push(r.methodology);
            }
        }
        out
    }

    /// Earliest and latest `start_date`.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.first()?.start_date;
        Some(self.records.iter().fold((first, first), |(lo, hi), r| {
            (lo.min(r.start_date), hi.max(r.start_date))
        }))
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus `.env` defaults).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub derive: DeriveConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methodology_labels_round_trip_case_insensitively() {
        assert_eq!(Methodology::from_label("Online"), Some(Methodology::Online));
        assert_eq!(Methodology::from_label(" PANEL "), Some(Methodology::Panel));
        assert_eq!(Methodology::from_label("live phone"), None);
        assert_eq!(Methodology::Unknown.to_string(), "unknown");
    }

    #[test]
    fn precleaned_config_marks_only_listed_columns() {
        let config = DeriveConfig::precleaned(&[DerivedColumn::Rolling]);
        assert_eq!(config.margin, ColumnSource::Computed);
        assert_eq!(config.rolling, ColumnSource::Source);
        assert_eq!(config.methodology, ColumnSource::Computed);
    }
}
