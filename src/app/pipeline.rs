//! Shared pipeline logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV load -> derive columns -> filter -> aggregate
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::aggregate::{
    DEFAULT_HISTOGRAM_BINS, DistributionStats, GroupSummary, PartyHistogram, ScatterPoint,
    ViewStats, by_methodology, by_pollster, distributions, party_histograms, sample_size_scatter,
    view_stats,
};
use crate::domain::{DashboardConfig, DeriveConfig, Methodology, PollDataset};
use crate::error::LoadError;
use crate::filter::{FilterRequest, PollView, SeriesSelection, filter};
use crate::io::ingest::{IngestedPolls, load_poll_rows, read_poll_rows};
use crate::transform::derive_records;

/// Load the CSV named by `config` and derive every column.
pub fn prepare_dataset(config: &DashboardConfig) -> Result<PollDataset, LoadError> {
    let ingest = load_poll_rows(&config.data_path, &config.derive)?;
    Ok(build_dataset(ingest, &config.derive, &config.data_path))
}

/// Same as `prepare_dataset`, for an already-open CSV source.
pub fn prepare_dataset_from_reader<R: Read>(
    reader: R,
    derive: &DeriveConfig,
    source: &Path,
) -> Result<PollDataset, LoadError> {
    let ingest = read_poll_rows(reader, derive)?;
    Ok(build_dataset(ingest, derive, source))
}

fn build_dataset(ingest: IngestedPolls, derive: &DeriveConfig, source: &Path) -> PollDataset {
    let IngestedPolls {
        rows,
        has_predicted_margin,
        rows_read,
    } = ingest;
    PollDataset {
        records: derive_records(rows, derive),
        has_predicted_margin,
        source: source.to_path_buf(),
        rows_read,
    }
}

/// All computed outputs for one set of selections.
#[derive(Debug, Clone)]
pub struct ViewOutput<'a> {
    pub request: FilterRequest,
    pub view: PollView<'a>,
    pub series: SeriesSelection,
    pub stats: Option<ViewStats>,
    pub pollsters: Vec<GroupSummary<String>>,
    pub methodologies: Vec<GroupSummary<Methodology>>,
    pub distributions: Vec<DistributionStats>,
}

/// Serializable subset of `ViewOutput` (for JSON export).
#[derive(Debug, Clone, Serialize)]
pub struct ViewReport<'o> {
    pub source: String,
    pub request: &'o FilterRequest,
    pub stats: &'o Option<ViewStats>,
    pub pollsters: &'o [GroupSummary<String>],
    pub methodologies: &'o [GroupSummary<Methodology>],
    pub distributions: &'o [DistributionStats],
    pub histograms: Vec<PartyHistogram>,
    pub scatter: Vec<ScatterPoint>,
}

impl<'a> ViewOutput<'a> {
    pub fn report(&self) -> ViewReport<'_> {
        ViewReport {
            source: self.view.dataset().source.display().to_string(),
            request: &self.request,
            stats: &self.stats,
            pollsters: &self.pollsters,
            methodologies: &self.methodologies,
            distributions: &self.distributions,
            histograms: party_histograms(&self.view, &self.series, DEFAULT_HISTOGRAM_BINS),
            scatter: sample_size_scatter(&self.view),
        }
    }
}

/// Filter the dataset and compute every aggregate the front-ends show.
pub fn run_view<'a>(dataset: &'a PollDataset, request: &FilterRequest) -> ViewOutput<'a> {
    let view = filter(dataset, request);
    let series = request.parties.series();

    ViewOutput {
        request: request.clone(),
        stats: view_stats(&view),
        pollsters: by_pollster(&view),
        methodologies: by_methodology(&view),
        distributions: distributions(&view, &series),
        series,
        view,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Party;
    use crate::filter::PartySelection;
    use chrono::NaiveDate;

    // Ten polls in file order.
    const SAMPLE: &str = "\
pollster,methodology,start_date,dem,rep,sample_size
Alpha,Live Phone,2024-01-01,45,43,1000
Beta,Online Panel,2024-01-02,44,44,1500
Alpha,Live Phone/Text,2024-01-03,46,42,1200
Gamma,Probability Panel,2024-01-04,43,45,900
Beta,Online Panel,2024-01-05,45,44,1600
Delta,,2024-01-06,44,46,800
Alpha,IVR/Live Phone/Text-to-Web,2024-01-07,47,43,1100
Gamma,Probability Panel,2024-01-08,44,44,950
Beta,Text-to-Web,2024-01-09,46,45,1400
Delta,Carrier Pigeon,2024-01-10,42,45,700
";

    fn sample() -> PollDataset {
        prepare_dataset_from_reader(SAMPLE.as_bytes(), &DeriveConfig::default(), Path::new("sample.csv"))
            .unwrap()
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn end_to_end_sample_matches_hand_computed_values() {
        let ds = sample();
        assert_eq!(ds.len(), 10);
        assert!(!ds.has_predicted_margin);

        let buckets: Vec<Methodology> = ds.records.iter().map(|r| r.methodology).collect();
        use Methodology::*;
        assert_eq!(
            buckets,
            [Phone, Online, Phone, Panel, Online, Unknown, Phone, Panel, Online, Unknown]
        );

        let margins: Vec<Option<f64>> = ds.records.iter().map(|r| r.margin).collect();
        let expected = [2.0, 0.0, 4.0, -2.0, 1.0, -2.0, 4.0, 0.0, 1.0, -3.0];
        for (m, e) in margins.iter().zip(expected) {
            assert!(close(*m, e));
        }

        // margin_roll7: first row equals itself, row 6 is mean(0..=6), row 9 is mean(3..=9).
        assert!(close(ds.records[0].margin_roll7, 2.0));
        assert!(close(ds.records[6].margin_roll7, 7.0 / 7.0));
        assert!(close(ds.records[9].margin_roll7, -1.0 / 7.0));
        assert!(close(ds.records[1].dem_roll7, 44.5));
        assert!(close(ds.records[9].rep_roll7, 312.0 / 7.0));

        let out = run_view(&ds, &FilterRequest::all_of(&ds));
        let pollsters: Vec<(&str, usize)> = out
            .pollsters
            .iter()
            .map(|g| (g.key.as_str(), g.count))
            .collect();
        // Delta -2.5, Gamma -1.0, Beta 2/3, Alpha 10/3
        assert_eq!(pollsters, [("Delta", 2), ("Gamma", 2), ("Beta", 3), ("Alpha", 3)]);
        assert!(close(out.pollsters[0].mean_margin, -2.5));
        assert!(close(out.pollsters[2].mean_margin, 2.0 / 3.0));
        assert!(close(out.pollsters[3].mean_margin, 10.0 / 3.0));
        assert_eq!(out.pollsters.iter().map(|g| g.count).sum::<usize>(), out.view.len());
    }

    #[test]
    fn filtered_view_keeps_unfiltered_rolling_window() {
        let ds = sample();
        let request = FilterRequest::default()
            .with_pollsters(["Delta"])
            .with_parties(PartySelection::of([Party::Dem]));
        let out = run_view(&ds, &request);

        assert_eq!(out.view.indices(), &[5, 9]);
        let last = out.view.iter().last().unwrap();
        assert!(close(last.margin_roll7, -1.0 / 7.0));
        assert_eq!(out.series, SeriesSelection::Selected(vec![Party::Dem]));
        assert_eq!(out.distributions.len(), 1);
        assert!(close(out.distributions[0].mean, 43.0));
    }

    #[test]
    fn empty_outputs_are_valid_states() {
        let ds = sample();
        let lo = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let hi = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let request = FilterRequest::default()
            .with_date_range(lo, hi)
            .with_parties(PartySelection::none());
        let out = run_view(&ds, &request);

        assert!(out.view.is_empty());
        assert_eq!(out.stats, None);
        assert!(out.pollsters.is_empty());
        assert_eq!(out.series, SeriesSelection::NoneSelected);
        assert!(out.distributions.is_empty());
    }

    #[test]
    fn report_serializes_to_json() {
        let ds = sample();
        let out = run_view(&ds, &FilterRequest::default());
        let json = serde_json::to_value(out.report()).unwrap();
        assert_eq!(json["source"], "sample.csv");
        assert_eq!(json["stats"]["rows"], 10);
        assert_eq!(json["methodologies"][0]["key"], "unknown");

        let histograms = json["histograms"].as_array().unwrap();
        assert_eq!(histograms.len(), 2);
        assert_eq!(histograms[0]["party"], "dem");
        let binned: u64 = histograms[0]["bins"]
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["count"].as_u64().unwrap())
            .sum();
        assert_eq!(binned as usize, out.distributions[0].n);
        assert!(json["scatter"].is_array());
    }
}
