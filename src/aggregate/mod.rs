//! Grouped summaries and distribution statistics over a filtered view.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Methodology, Party, PollRecord};
use crate::filter::{PollView, SeriesSelection};

/// Default number of histogram bins for the support distribution.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// One group of a per-pollster or per-methodology reduction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary<K> {
    pub key: K,
    /// Rows in the group (including rows without a margin).
    pub count: usize,
    /// Mean of the present margins; `None` if the group has none.
    pub mean_margin: Option<f64>,
}

/// Mean and sample standard deviation of one party column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistributionStats {
    pub party: Party,
    /// Present (non-missing) values.
    pub n: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
}

impl DistributionStats {
    /// `(mean - std, mean, mean + std)`, when both are defined.
    pub fn band(&self) -> Option<(f64, f64, f64)> {
        let (mean, std) = (self.mean?, self.std?);
        Some((mean - std, mean, mean + std))
    }
}

/// Equal-width histogram bin, `[lo, hi)` except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

/// Support histogram for one selected party.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartyHistogram {
    pub party: Party,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub sample_size: f64,
    pub margin: f64,
    pub pollster: String,
}

/// Headline numbers for a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewStats {
    pub rows: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub mean_margin: Option<f64>,
    /// Rolling margin on the last row of the view.
    pub latest_margin_roll7: Option<f64>,
    pub latest_predicted_margin: Option<f64>,
}

/// Per-pollster count and mean margin, ascending by mean margin.
pub fn by_pollster(view: &PollView<'_>) -> Vec<GroupSummary<String>> {
    group_by(view, |r| r.pollster.clone())
}

/// Per-methodology-bucket count and mean margin, ascending by mean margin.
pub fn by_methodology(view: &PollView<'_>) -> Vec<GroupSummary<Methodology>> {
    group_by(view, |r| r.methodology)
}

fn group_by<K, F>(view: &PollView<'_>, key_of: F) -> Vec<GroupSummary<K>>
where
    K: PartialEq,
    F: Fn(&PollRecord) -> K,
{
    // (key, rows, margin sum, margins present), in first-encounter order.
    let mut groups: Vec<(K, usize, f64, usize)> = Vec::new();

    for record in view.iter() {
        let key = key_of(record);
        let idx = match groups.iter().position(|g| g.0 == key) {
            Some(idx) => idx,
            None => {
                groups.push((key, 0, 0.0, 0));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.1 += 1;
        if let Some(m) = record.margin {
            group.2 += m;
            group.3 += 1;
        }
    }

    let mut out: Vec<GroupSummary<K>> = groups
        .into_iter()
        .map(|(key, count, sum, n)| GroupSummary {
            key,
            count,
            mean_margin: (n > 0).then(|| sum / n as f64),
        })
        .collect();

    // `sort_by` is stable, so ties keep encounter order.
    out.sort_by(|a, b| cmp_mean(a.mean_margin, b.mean_margin));
    out
}

fn cmp_mean(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Re-order summaries by descending row count (stable).
pub fn counts_desc<K: Clone>(groups: &[GroupSummary<K>]) -> Vec<GroupSummary<K>> {
    let mut out = groups.to_vec();
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Summaries in the order of `keys`, skipping keys with no rows in the view.
pub fn restrict_to<K: Clone + PartialEq>(groups: &[GroupSummary<K>], keys: &[K]) -> Vec<GroupSummary<K>> {
    keys.iter()
        .filter_map(|k| groups.iter().find(|g| &g.key == k).cloned())
        .collect()
}

/// Mean and sample standard deviation (N-1) of one party over the view.
pub fn distribution(view: &PollView<'_>, party: Party) -> DistributionStats {
    let values: Vec<f64> = view.iter().filter_map(|r| party.value(r)).collect();
    let (mean, std) = mean_std(&values);
    DistributionStats {
        party,
        n: values.len(),
        mean,
        std,
    }
}

/// Distribution stats for every selected party, in selection order.
pub fn distributions(view: &PollView<'_>, series: &SeriesSelection) -> Vec<DistributionStats> {
    series
        .parties()
        .iter()
        .map(|&party| distribution(view, party))
        .collect()
}

fn mean_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    let n = values.len();
    if n == 0 {
        return (None, None);
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return (Some(mean), None);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    (Some(mean), Some(var.sqrt()))
}

/// Equal-width histogram over the present values.
///
/// Returns no bins when there are no values. A constant column gets a
/// single unit-wide bin centred on the value.
pub fn histogram(values: &[Option<f64>], bins: usize) -> Vec<HistogramBin> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(&first) = present.first() else {
        return Vec::new();
    };
    let (lo, hi) = present
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if hi <= lo {
        return vec![HistogramBin {
            lo: lo - 0.5,
            hi: hi + 0.5,
            count: present.len(),
        }];
    }

    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lo: lo + width * i as f64,
            hi: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();

    for v in present {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Support histogram for one party over the view.
pub fn party_histogram(view: &PollView<'_>, party: Party, bins: usize) -> Vec<HistogramBin> {
    let values: Vec<Option<f64>> = view.iter().map(|r| party.value(r)).collect();
    histogram(&values, bins)
}

/// One histogram per selected party; empty when no party is selected.
pub fn party_histograms(view: &PollView<'_>, series: &SeriesSelection, bins: usize) -> Vec<PartyHistogram> {
    series
        .parties()
        .iter()
        .map(|&party| PartyHistogram {
            party,
            bins: party_histogram(view, party, bins),
        })
        .collect()
}

/// `(sample_size, margin)` pairs for rows that have both.
pub fn sample_size_scatter(view: &PollView<'_>) -> Vec<ScatterPoint> {
    view.iter()
        .filter_map(|r| {
            Some(ScatterPoint {
                sample_size: r.sample_size?,
                margin: r.margin?,
                pollster: r.pollster.clone(),
            })
        })
        .collect()
}

/// Headline stats; `None` for an empty view.
pub fn view_stats(view: &PollView<'_>) -> Option<ViewStats> {
    let (first_date, last_date) = view.date_bounds()?;
    let margins: Vec<f64> = view.iter().filter_map(|r| r.margin).collect();
    let (mean_margin, _) = mean_std(&margins);
    let last = view.iter().last()?;

    Some(ViewStats {
        rows: view.len(),
        first_date,
        last_date,
        mean_margin,
        latest_margin_roll7: last.margin_roll7,
        latest_predicted_margin: if view.dataset().has_predicted_margin {
            last.predicted_margin
        } else {
            None
        },
    })
}
