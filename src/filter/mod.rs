//! Filter engine: sidebar selections as an explicit request value.
//!
//! A `FilterRequest` is a conjunction of optional predicates. Applying it
//! never copies or mutates records; the result is a `PollView` of row indices
//! into the borrowed dataset, in original order.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use crate::domain::{Methodology, Party, PollDataset, PollRecord};

/// Inclusive `start_date` bounds. `lo > hi` is allowed and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub lo: NaiveDate,
    pub hi: NaiveDate,
}

impl DateRange {
    pub fn new(lo: NaiveDate, hi: NaiveDate) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.lo <= date && date <= self.hi
    }
}

/// Which party columns are exposed to margin-series and distribution views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartySelection(BTreeSet<Party>);

impl PartySelection {
    pub fn all() -> Self {
        Self(Party::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn of(parties: impl IntoIterator<Item = Party>) -> Self {
        Self(parties.into_iter().collect())
    }

    pub fn contains(&self, party: Party) -> bool {
        self.0.contains(&party)
    }

    /// Flip one party in or out of the selection.
    pub fn toggled(&self, party: Party) -> Self {
        let mut set = self.0.clone();
        if !set.remove(&party) {
            set.insert(party);
        }
        Self(set)
    }

    pub fn series(&self) -> SeriesSelection {
        if self.0.is_empty() {
            SeriesSelection::NoneSelected
        } else {
            SeriesSelection::Selected(self.0.iter().copied().collect())
        }
    }
}

impl Default for PartySelection {
    fn default() -> Self {
        Self::all()
    }
}

/// Party columns to draw, or an explicit signal that there are none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesSelection {
    Selected(Vec<Party>),
    NoneSelected,
}

impl SeriesSelection {
    pub fn parties(&self) -> &[Party] {
        match self {
            SeriesSelection::Selected(parties) => parties,
            SeriesSelection::NoneSelected => &[],
        }
    }
}

/// The full set of user selections, passed by value into pure functions.
///
/// `None` for a row predicate means "unconstrained"; an empty set means the
/// user deselected every option and nothing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterRequest {
    pub pollsters: Option<BTreeSet<String>>,
    pub methodologies: Option<BTreeSet<Methodology>>,
    pub date_range: Option<DateRange>,
    pub parties: PartySelection,
}

impl FilterRequest {
    /// Everything selected: every pollster and bucket present, the dataset's
    /// own date span, both parties.
    pub fn all_of(dataset: &PollDataset) -> Self {
        Self {
            pollsters: Some(dataset.pollsters().into_iter().collect()),
            methodologies: Some(dataset.methodologies().into_iter().collect()),
            date_range: dataset.date_bounds().map(|(lo, hi)| DateRange::new(lo, hi)),
            parties: PartySelection::all(),
        }
    }

    pub fn with_pollsters<I, S>(mut self, pollsters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pollsters = Some(pollsters.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_methodologies(mut self, methodologies: impl IntoIterator<Item = Methodology>) -> Self {
        self.methodologies = Some(methodologies.into_iter().collect());
        self
    }

    pub fn with_date_range(mut self, lo: NaiveDate, hi: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(lo, hi));
        self
    }

    pub fn with_parties(mut self, parties: PartySelection) -> Self {
        self.parties = parties;
        self
    }

    /// Row predicate (party selection is a column filter and never drops rows).
    pub fn matches(&self, record: &PollRecord) -> bool {
        if let Some(pollsters) = &self.pollsters {
            if !pollsters.contains(&record.pollster) {
                return false;
            }
        }
        if let Some(methodologies) = &self.methodologies {
            if !methodologies.contains(&record.methodology) {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            if !range.contains(record.start_date) {
                return false;
            }
        }
        true
    }
}

/// An ordered subset of a dataset's rows.
#[derive(Debug, Clone)]
pub struct PollView<'a> {
    dataset: &'a PollDataset,
    rows: Vec<usize>,
}

impl<'a> PollView<'a> {
    /// A view over every row.
    pub fn full(dataset: &'a PollDataset) -> Self {
        Self {
            dataset,
            rows: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'a PollDataset {
        self.dataset
    }

    /// Indices into `dataset().records`, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a PollRecord> + '_ {
        let records = &self.dataset().records;
        self.rows.iter().map(move |&i| &records[i])
    }

    /// Apply a further request to this view.
    pub fn refine(&self, request: &FilterRequest) -> PollView<'a> {
        let records = &self.dataset().records;
        let rows: Vec<usize> = self
            .rows
            .iter()
            .copied()
            .filter(|&i| request.matches(&records[i]))
            .collect();
        debug!("filter kept {} of {} rows", rows.len(), self.rows.len());
        PollView {
            dataset: self.dataset,
            rows,
        }
    }

    /// Earliest and latest `start_date` within the view.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut iter = self.iter();
        let first = iter.next()?.start_date;
        Some(iter.fold((first, first), |(lo, hi), r| {
            (lo.min(r.start_date), hi.max(r.start_date))
        }))
    }
}

impl PartialEq for PollView<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.dataset, other.dataset) && self.rows == other.rows
    }
}

/// Filter the full dataset.
pub fn filter<'a>(dataset: &'a PollDataset, request: &FilterRequest) -> PollView<'a> {
    PollView::full(dataset).refine(request)
}
