//! CSV ingest.
//!
//! This module is responsible for turning the poll CSV into raw `PollRow`s.
//!
//! Design goals:
//! - **Strict schema** for required columns
//! - **Strict dates**: one bad `start_date` fails the whole load
//! - **Lenient numbers**: blank or unparseable support values become missing
//! - **No derivation here**: margins, rolling means and buckets live in `transform`

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use log::{debug, info, warn};
use snafu::{OptionExt, ResultExt};

use crate::domain::{ColumnSource, DeriveConfig, PollRow};
use crate::error::{
    HeadersSnafu, InvalidDateSnafu, LoadError, MissingColumnSnafu, MissingValueSnafu, OpenSnafu,
    RecordSnafu,
};

const REQUIRED_COLUMNS: [&str; 6] = [
    "pollster",
    "methodology",
    "start_date",
    "dem",
    "rep",
    "sample_size",
];

const ROLLING_COLUMNS: [&str; 3] = ["dem_roll7", "rep_roll7", "margin_roll7"];

/// Tokens treated as an explicit missing value.
const NA_TOKENS: [&str; 5] = ["na", "n/a", "nan", "null", "none"];

/// Ingest output: raw rows + column capabilities.
#[derive(Debug, Clone)]
pub struct IngestedPolls {
    pub rows: Vec<PollRow>,
    pub has_predicted_margin: bool,
    pub rows_read: usize,
}

/// Open and read the poll CSV at `path`.
pub fn load_poll_rows(path: &Path, derive: &DeriveConfig) -> Result<IngestedPolls, LoadError> {
    let file = File::open(path).context(OpenSnafu { path })?;
    info!("reading polls from {}", path.display());
    read_poll_rows(file, derive)
}

/// Read poll rows from any CSV source.
pub fn read_poll_rows<R: Read>(reader: R, derive: &DeriveConfig) -> Result<IngestedPolls, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().context(HeadersSnafu)?.clone();
    let header_map = build_header_map(&headers);

    ensure_required_columns_exist(&header_map, derive)?;
    let has_predicted_margin = header_map.contains_key("predicted_margin");
    if !has_predicted_margin {
        debug!("no `predicted_margin` column; predicted series disabled");
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        let record = result.context(RecordSnafu { line })?;
        rows.push(parse_row(&record, &header_map, line)?);
    }

    if rows.windows(2).any(|w| w[1].start_date < w[0].start_date) {
        warn!("start_date is not sorted ascending; rolling means follow file order");
    }

    let rows_read = rows.len();
    info!("loaded {rows_read} poll rows");

    Ok(IngestedPolls {
        rows,
        has_predicted_margin,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_required_columns_exist(
    header_map: &HashMap<String, usize>,
    derive: &DeriveConfig,
) -> Result<(), LoadError> {
    let mut required: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    if derive.margin == ColumnSource::Source {
        required.push("margin");
    }
    if derive.rolling == ColumnSource::Source {
        required.extend(ROLLING_COLUMNS);
    }

    for name in required {
        if !header_map.contains_key(name) {
            return MissingColumnSnafu { name }.fail();
        }
    }
    Ok(())
}

fn parse_row(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    line: usize,
) -> Result<PollRow, LoadError> {
    let pollster = get_optional(record, header_map, "pollster")
        .context(MissingValueSnafu {
            column: "pollster",
            line,
        })?
        .to_string();

    let date_raw = get_optional(record, header_map, "start_date").context(MissingValueSnafu {
        column: "start_date",
        line,
    })?;
    let start_date = parse_date(date_raw).context(InvalidDateSnafu {
        value: date_raw,
        line,
    })?;

    let number = |name: &str| parse_opt_f64(get_optional(record, header_map, name), name, line);

    Ok(PollRow {
        pollster,
        methodology: get_optional(record, header_map, "methodology").map(str::to_string),
        start_date,
        dem: number("dem"),
        rep: number("rep"),
        sample_size: number("sample_size"),
        predicted_margin: number("predicted_margin"),
        margin: number("margin"),
        dem_roll7: number("dem_roll7"),
        rep_roll7: number("rep_roll7"),
        margin_roll7: number("margin_roll7"),
    })
}

fn get_optional<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a calendar date; timestamps are truncated to their date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

    let s = s.trim();
    DATE_FMTS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FMTS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        // Timestamps with an offset keep the calendar date as written.
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

fn parse_opt_f64(s: Option<&str>, column: &str, line: usize) -> Option<f64> {
    let s = s?;
    if NA_TOKENS.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!("line {line}: non-numeric `{column}` value '{s}' treated as missing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DerivedColumn;

    const HEADER: &str = "pollster,methodology,start_date,dem,rep,sample_size\n";

    fn read(csv: &str) -> Result<IngestedPolls, LoadError> {
        read_poll_rows(csv.as_bytes(), &DeriveConfig::default())
    }

    #[test]
    fn parses_rows_in_file_order() {
        let csv = format!(
            "{HEADER}YouGov,Online Panel,2024-01-03,45,43,1500\nIpsos,,2024-01-01,44.5,,\n"
        );
        let ingest = read(&csv).unwrap();

        assert_eq!(ingest.rows_read, 2);
        assert!(!ingest.has_predicted_margin);
        let first = &ingest.rows[0];
        assert_eq!(first.pollster, "YouGov");
        assert_eq!(first.methodology.as_deref(), Some("Online Panel"));
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(first.sample_size, Some(1500.0));

        let second = &ingest.rows[1];
        assert_eq!(second.methodology, None);
        assert_eq!(second.rep, None);
        assert_eq!(second.sample_size, None);
    }

    #[test]
    fn headers_are_case_and_bom_insensitive() {
        let csv = "\u{feff}Pollster,METHODOLOGY,Start_Date,Dem,Rep,Sample_Size,Predicted_Margin\nA,Live Phone,2024-02-01,1,2,3,0.5\n";
        let ingest = read(csv).unwrap();
        assert!(ingest.has_predicted_margin);
        assert_eq!(ingest.rows[0].predicted_margin, Some(0.5));
    }

    #[test]
    fn missing_required_column_fails() {
        let err = read("pollster,start_date,dem,rep,sample_size\n").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref name } if name == "methodology"));
    }

    #[test]
    fn precleaned_rolling_requires_its_columns() {
        let config = DeriveConfig::precleaned(&[DerivedColumn::Rolling]);
        let err = read_poll_rows(HEADER.as_bytes(), &config).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref name } if name == "dem_roll7"));
    }

    #[test]
    fn one_bad_date_fails_the_load() {
        let csv = format!("{HEADER}A,x,2024-01-01,1,2,3\nB,x,yesterday,1,2,3\n");
        let err = read(&csv).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { line: 3, .. }));
    }

    #[test]
    fn blank_date_fails_the_load() {
        let csv = format!("{HEADER}A,x,,1,2,3\n");
        let err = read(&csv).unwrap_err();
        assert!(matches!(err, LoadError::MissingValue { line: 2, .. }));
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(d));
        assert_eq!(parse_date("2024/03/09"), Some(d));
        assert_eq!(parse_date("03/09/2024"), Some(d));
        assert_eq!(parse_date("2024-03-09 12:30:00"), Some(d));
        assert_eq!(parse_date("2024-03-09T00:00:00"), Some(d));
        assert_eq!(parse_date("09.03.2024"), None);
    }

    #[test]
    fn offset_timestamps_parse_to_their_date() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(parse_date("2024-01-05T00:00:00Z"), Some(d));
        assert_eq!(parse_date("2024-01-05T23:15:00+00:00"), Some(d));
        assert_eq!(parse_date("2024-01-05T08:00:00-05:00"), Some(d));

        let csv = format!("{HEADER}A,x,2024-01-05T00:00:00Z,1,2,3\n");
        assert_eq!(read(&csv).unwrap().rows[0].start_date, d);
    }

    #[test]
    fn na_and_garbage_numbers_become_missing() {
        let csv = format!("{HEADER}A,x,2024-01-01,NA,abc,NaN\n");
        let row = &read(&csv).unwrap().rows[0];
        assert_eq!(row.dem, None);
        assert_eq!(row.rep, None);
        assert_eq!(row.sample_size, None);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = load_poll_rows(Path::new("does/not/exist.csv"), &DeriveConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }
}
