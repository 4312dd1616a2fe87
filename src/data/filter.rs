use std::collections::BTreeSet;

use thiserror::Error;

use super::model::{SalesDataset, TransactionRow};

// ---------------------------------------------------------------------------
// Week interval
// ---------------------------------------------------------------------------

/// Closed week interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: u8,
    pub end: u8,
}

impl WeekRange {
    /// Build a range, swapping the ends if they arrive reversed.
    pub fn new(a: u8, b: u8) -> Self {
        WeekRange {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn contains(&self, week: u8) -> bool {
        self.start <= week && week <= self.end
    }

    /// Clamp both ends into `bounds`.  A range lying entirely outside the
    /// bounds collapses onto the nearest bound.
    pub fn clamp_to(self, bounds: WeekRange) -> WeekRange {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(bounds.start, bounds.end);
        WeekRange::new(start, end)
    }
}

impl Default for WeekRange {
    fn default() -> Self {
        WeekRange { start: 1, end: 53 }
    }
}

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// The analyst's current filter choices.  Filters are conjunctive: an empty
/// location set selects nothing, it never means "all locations".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub locations: BTreeSet<String>,
    pub years: BTreeSet<i32>,
    pub weeks: WeekRange,
}

impl FilterSelection {
    /// Everything selected: every location, every year and the full week
    /// range those years span.
    pub fn all(dataset: &SalesDataset) -> Self {
        let years: BTreeSet<i32> = dataset.years.iter().copied().collect();
        let weeks = week_bounds(dataset, &years).unwrap_or_default();
        FilterSelection {
            locations: dataset.locations.iter().cloned().collect(),
            years,
            weeks,
        }
    }

    pub fn matches(&self, row: &TransactionRow) -> bool {
        self.locations.contains(&row.location)
            && self.years.contains(&row.year)
            && self.weeks.contains(row.week)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("select at least one year to see the report")]
    NoYearSelected,
}

/// Min/max week among rows whose year is selected.  `None` when no row
/// belongs to any selected year.
pub fn week_bounds(dataset: &SalesDataset, years: &BTreeSet<i32>) -> Option<WeekRange> {
    dataset
        .rows
        .iter()
        .filter(|row| years.contains(&row.year))
        .fold(None, |acc: Option<WeekRange>, row| {
            Some(match acc {
                None => WeekRange::new(row.week, row.week),
                Some(r) => WeekRange::new(r.start.min(row.week), r.end.max(row.week)),
            })
        })
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of the base table passing the current selection, in source order.
/// Borrowed from the dataset and rebuilt on every filter change.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a TransactionRow>,
}

impl<'a> FilteredView<'a> {
    #[cfg(test)]
    pub fn from_rows(rows: Vec<&'a TransactionRow>) -> Self {
        FilteredView { rows }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TransactionRow> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Apply `selection` to the dataset.
///
/// An empty year set is refused rather than producing an empty or
/// unfiltered view; the caller must ask the analyst to pick a year.
pub fn resolve<'a>(
    dataset: &'a SalesDataset,
    selection: &FilterSelection,
) -> Result<FilteredView<'a>, FilterError> {
    if selection.years.is_empty() {
        return Err(FilterError::NoYearSelected);
    }
    let rows = dataset
        .rows
        .iter()
        .filter(|row| selection.matches(row))
        .collect();
    Ok(FilteredView { rows })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::data::model::tests::row;

    fn scenario() -> SalesDataset {
        SalesDataset::from_rows(vec![
            row("A", 2019, 1, 10.0),
            row("B", 2019, 1, 20.0),
            row("A", 2020, 1, 5.0),
        ])
    }

    fn revenue(view: &FilteredView<'_>) -> f64 {
        view.iter().map(|r| r.total).sum()
    }

    fn selection(locations: &[&str], years: &[i32], weeks: WeekRange) -> FilterSelection {
        FilterSelection {
            locations: locations.iter().map(|l| l.to_string()).collect(),
            years: years.iter().copied().collect(),
            weeks,
        }
    }

    #[test]
    fn year_filter_scenario() {
        let ds = scenario();
        let sel = selection(&["A", "B"], &[2019], WeekRange::default());
        let view = resolve(&ds, &sel).unwrap();
        assert_eq!(revenue(&view), 30.0);
    }

    #[test]
    fn location_filter_scenario() {
        let ds = scenario();
        let sel = selection(&["A"], &[2019, 2020], WeekRange::default());
        let view = resolve(&ds, &sel).unwrap();
        assert_eq!(revenue(&view), 15.0);
    }

    #[test]
    fn empty_locations_select_nothing() {
        let ds = scenario();
        let sel = selection(&[], &[2019, 2020], WeekRange::default());
        assert!(resolve(&ds, &sel).unwrap().is_empty());
    }

    #[test]
    fn empty_years_are_refused() {
        let ds = scenario();
        let sel = selection(&["A", "B"], &[], WeekRange::default());
        assert_eq!(resolve(&ds, &sel).unwrap_err(), FilterError::NoYearSelected);
    }

    #[test]
    fn default_selection_keeps_every_row() {
        let ds = scenario();
        let sel = FilterSelection::all(&ds);
        assert_eq!(sel.weeks, WeekRange::new(1, 1));
        assert_eq!(resolve(&ds, &sel).unwrap().len(), ds.len());
    }

    #[test]
    fn week_bounds_follow_selected_years() {
        let ds = SalesDataset::from_rows(vec![
            row("A", 2019, 1, 1.0),
            row("A", 2019, 52, 1.0),
            row("A", 2020, 2, 1.0),
            row("A", 2020, 32, 1.0),
        ]);
        let only_2020: BTreeSet<i32> = [2020].into_iter().collect();
        let both: BTreeSet<i32> = [2019, 2020].into_iter().collect();
        assert_eq!(week_bounds(&ds, &only_2020), Some(WeekRange::new(2, 32)));
        assert_eq!(week_bounds(&ds, &both), Some(WeekRange::new(1, 52)));
        assert_eq!(week_bounds(&ds, &BTreeSet::new()), None);
    }

    #[test]
    fn week_range_is_inclusive() {
        let ds = SalesDataset::from_rows(vec![
            row("A", 2019, 4, 1.0),
            row("A", 2019, 5, 2.0),
            row("A", 2019, 9, 4.0),
            row("A", 2019, 10, 8.0),
        ]);
        let sel = selection(&["A"], &[2019], WeekRange::new(5, 9));
        assert_eq!(revenue(&resolve(&ds, &sel).unwrap()), 6.0);
    }

    #[test]
    fn clamp_pulls_range_into_new_bounds() {
        let bounds = WeekRange::new(2, 32);
        assert_eq!(WeekRange::new(1, 52).clamp_to(bounds), bounds);
        assert_eq!(WeekRange::new(10, 40).clamp_to(bounds), WeekRange::new(10, 32));
        assert_eq!(WeekRange::new(40, 50).clamp_to(bounds), WeekRange::new(32, 32));
        assert_eq!(WeekRange::new(9, 3), WeekRange::new(3, 9));
    }

    fn arb_rows() -> impl Strategy<Value = Vec<TransactionRow>> {
        let loc = prop::sample::select(vec!["A", "B", "C"]);
        prop::collection::vec(
            (loc, 2019i32..=2021, 1u8..=53, 0.0f64..100.0)
                .prop_map(|(l, y, w, t)| row(l, y, w, t)),
            0..60,
        )
    }

    proptest! {
        /// Shrinking any filter set never adds rows to the view.
        #[test]
        fn shrinking_filters_never_adds_rows(
            rows in arb_rows(),
            drop_location in prop::sample::select(vec!["A", "B", "C"]),
            drop_year in 2019i32..=2021,
            (lo, hi) in (1u8..=53, 1u8..=53),
        ) {
            let ds = SalesDataset::from_rows(rows);
            let wide = selection(&["A", "B", "C"], &[2019, 2020, 2021], WeekRange::default());

            let mut fewer_locations = wide.clone();
            fewer_locations.locations.remove(drop_location);
            let mut fewer_years = wide.clone();
            fewer_years.years.remove(&drop_year);
            let mut narrower_weeks = wide.clone();
            narrower_weeks.weeks = WeekRange::new(lo, hi);

            let full = resolve(&ds, &wide).unwrap().len();
            prop_assert_eq!(full, ds.len());
            prop_assert!(resolve(&ds, &fewer_locations).unwrap().len() <= full);
            prop_assert!(resolve(&ds, &fewer_years).unwrap().len() <= full);
            prop_assert!(resolve(&ds, &narrower_weeks).unwrap().len() <= full);
        }
    }
}
