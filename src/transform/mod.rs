//! Derived columns: margin, trailing means, methodology buckets.
//!
//! Everything here runs once on the full dataset, in load order, before any
//! filter is applied. A filtered view therefore reports the rolling values of
//! the unfiltered trailing window.

pub mod methodology;
pub mod rolling;

pub use methodology::{from_precleaned, normalize};
pub use rolling::rolling_mean;

use crate::domain::{ColumnSource, DeriveConfig, PollRecord, PollRow, ROLLING_WINDOW};

/// `dem - rep`, propagating missing values.
pub fn margin(dem: Option<f64>, rep: Option<f64>) -> Option<f64> {
    Some(dem? - rep?)
}

/// Turn raw rows into fully derived records.
pub fn derive_records(rows: Vec<PollRow>, config: &DeriveConfig) -> Vec<PollRecord> {
    let margins: Vec<Option<f64>> = match config.margin {
        ColumnSource::Computed => rows.iter().map(|r| margin(r.dem, r.rep)).collect(),
        ColumnSource::Source => rows.iter().map(|r| r.margin).collect(),
    };

    let (dem_roll, rep_roll, margin_roll) = match config.rolling {
        ColumnSource::Computed => {
            let dem: Vec<Option<f64>> = rows.iter().map(|r| r.dem).collect();
            let rep: Vec<Option<f64>> = rows.iter().map(|r| r.rep).collect();
            (
                rolling_mean(&dem, ROLLING_WINDOW),
                rolling_mean(&rep, ROLLING_WINDOW),
                rolling_mean(&margins, ROLLING_WINDOW),
            )
        }
        ColumnSource::Source => (
            rows.iter().map(|r| r.dem_roll7).collect(),
            rows.iter().map(|r| r.rep_roll7).collect(),
            rows.iter().map(|r| r.margin_roll7).collect(),
        ),
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| {
            let methodology = match config.methodology {
                ColumnSource::Computed => normalize(row.methodology.as_deref()),
                ColumnSource::Source => from_precleaned(row.methodology.as_deref()),
            };
            PollRecord {
                pollster: row.pollster,
                methodology_raw: row.methodology,
                methodology,
                start_date: row.start_date,
                dem: row.dem,
                rep: row.rep,
                sample_size: row.sample_size,
                margin: margins[i],
                dem_roll7: dem_roll[i],
                rep_roll7: rep_roll[i],
                margin_roll7: margin_roll[i],
                predicted_margin: row.predicted_margin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DerivedColumn, Methodology};
    use chrono::NaiveDate;

    fn row(dem: Option<f64>, rep: Option<f64>, methodology: Option<&str>) -> PollRow {
        PollRow {
            pollster: "P".to_string(),
            methodology: methodology.map(str::to_string),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            dem,
            rep,
            sample_size: None,
            predicted_margin: None,
            margin: Some(99.0),
            dem_roll7: Some(1.0),
            rep_roll7: Some(2.0),
            margin_roll7: Some(3.0),
        }
    }

    #[test]
    fn margin_propagates_missing() {
        assert_eq!(margin(Some(45.0), Some(43.5)), Some(1.5));
        assert_eq!(margin(None, Some(43.5)), None);
        assert_eq!(margin(Some(45.0), None), None);
    }

    #[test]
    fn computed_columns_ignore_source_values() {
        let rows = vec![
            row(Some(46.0), Some(44.0), Some("Live Phone")),
            row(Some(44.0), None, None),
        ];
        let records = derive_records(rows, &DeriveConfig::default());

        assert_eq!(records[0].margin, Some(2.0));
        assert_eq!(records[1].margin, None);
        assert_eq!(records[0].dem_roll7, Some(46.0));
        assert_eq!(records[1].dem_roll7, Some(45.0));
        assert_eq!(records[1].rep_roll7, Some(44.0));
        assert_eq!(records[1].margin_roll7, Some(2.0));
        assert_eq!(records[0].methodology, Methodology::Phone);
        assert_eq!(records[1].methodology, Methodology::Unknown);
        assert_eq!(records[0].methodology_raw.as_deref(), Some("Live Phone"));
    }

    #[test]
    fn precleaned_columns_are_read_verbatim() {
        let rows = vec![row(Some(46.0), Some(44.0), Some("panel"))];
        let config = DeriveConfig::precleaned(&[
            DerivedColumn::Margin,
            DerivedColumn::Rolling,
            DerivedColumn::Methodology,
        ]);
        let records = derive_records(rows, &config);

        assert_eq!(records[0].margin, Some(99.0));
        assert_eq!(records[0].dem_roll7, Some(1.0));
        assert_eq!(records[0].rep_roll7, Some(2.0));
        assert_eq!(records[0].margin_roll7, Some(3.0));
        assert_eq!(records[0].methodology, Methodology::Panel);
    }

    #[test]
    fn rolling_uses_precleaned_margin_when_computed() {
        let rows = vec![row(Some(46.0), Some(44.0), None), row(Some(46.0), Some(44.0), None)];
        let config = DeriveConfig::precleaned(&[DerivedColumn::Margin]);
        let records = derive_records(rows, &config);
        assert_eq!(records[1].margin_roll7, Some(99.0));
    }
}
