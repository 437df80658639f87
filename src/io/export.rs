//! Export a filtered view to CSV and its aggregates to JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::app::pipeline::ViewReport;
use crate::domain::PollRecord;
use crate::error::AppError;
use crate::filter::PollView;

/// Write the view's rows to a CSV file, in view order.
///
/// `predicted_margin` is only written when the source had that column.
pub fn write_view_csv(path: &Path, view: &PollView<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_view(file, view)
}

fn write_view<W: Write>(out: W, view: &PollView<'_>) -> Result<(), AppError> {
    let with_predicted = view.dataset().has_predicted_margin;
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec![
        "pollster",
        "methodology_raw",
        "methodology",
        "start_date",
        "dem",
        "rep",
        "sample_size",
        "margin",
        "dem_roll7",
        "rep_roll7",
        "margin_roll7",
    ];
    if with_predicted {
        header.push("predicted_margin");
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV header: {e}")))?;

    for r in view.iter() {
        let mut fields = record_fields(r);
        if !with_predicted {
            fields.pop();
        }
        writer
            .write_record(&fields)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn record_fields(r: &PollRecord) -> Vec<String> {
    let num = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    vec![
        r.pollster.clone(),
        r.methodology_raw.clone().unwrap_or_default(),
        r.methodology.to_string(),
        r.start_date.to_string(),
        num(r.dem),
        num(r.rep),
        num(r.sample_size),
        num(r.margin),
        num(r.dem_roll7),
        num(r.rep_roll7),
        num(r.margin_roll7),
        num(r.predicted_margin),
    ]
}

/// Write the aggregates for a view as pretty JSON.
pub fn write_report_json(path: &Path, report: &ViewReport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(4, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{prepare_dataset_from_reader, run_view};
    use crate::domain::DeriveConfig;
    use crate::filter::{FilterRequest, filter};

    fn export(csv: &str) -> String {
        let ds = prepare_dataset_from_reader(csv.as_bytes(), &DeriveConfig::default(), Path::new("t.csv"))
            .unwrap();
        let view = filter(&ds, &FilterRequest::default().with_pollsters(["B"]));
        let mut buf = Vec::new();
        write_view(&mut buf, &view).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn exports_only_view_rows_with_derived_columns() {
        let out = export(
            "pollster,methodology,start_date,dem,rep,sample_size\n\
             A,Live Phone,2024-01-01,45,43,1000\n\
             B,Online,2024-01-02,44,,900\n",
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(!lines[0].contains("predicted_margin"));
        assert_eq!(lines[1], "B,Online,online,2024-01-02,44,,900,,44.5,43,2");
    }

    #[test]
    fn unwritable_export_paths_are_output_failures() {
        let ds = prepare_dataset_from_reader(
            "pollster,methodology,start_date,dem,rep,sample_size\nA,Online,2024-01-01,45,43,1000\n".as_bytes(),
            &DeriveConfig::default(),
            Path::new("t.csv"),
        )
        .unwrap();
        let out = run_view(&ds, &FilterRequest::default());
        let missing_dir = std::env::temp_dir().join("poll-dash-missing-dir").join("nested");

        let err = write_view_csv(&missing_dir.join("out.csv"), &out.view).unwrap_err();
        assert_eq!(err.exit_code(), 4);

        let err = write_report_json(&missing_dir.join("out.json"), &out.report()).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn predicted_margin_is_exported_when_present() {
        let out = export(
            "pollster,methodology,start_date,dem,rep,sample_size,predicted_margin\n\
             B,Online,2024-01-02,44,43,900,1.25\n",
        );
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].ends_with("predicted_margin"));
        assert!(lines[1].ends_with(",1.25"));
    }
}
