use std::path::Path;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::filter::{week_bounds, FilterError, FilterSelection, WeekRange};
use crate::data::loader::{load_file, LoadError};
use crate::data::model::SalesDataset;
use crate::report::{DashboardSnapshot, ProductQuery};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<SalesDataset>,

    /// Location / year / week filters.
    pub selection: FilterSelection,

    /// Week slider limits for the selected years.  `None` when no row
    /// matches the selected years.
    pub week_bounds: Option<WeekRange>,

    /// Family and price-lookup selections of the product section.
    pub products: ProductQuery,

    /// Result of the last recomputation (cached until a selection changes).
    pub snapshot: Option<Result<DashboardSnapshot, FilterError>>,

    /// Per-location chart colours.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            selection: FilterSelection::default(),
            week_bounds: None,
            products: ProductQuery::default(),
            snapshot: None,
            color_map: None,
            status_message: None,
        }
    }

    /// Load `path` and make it the active dataset.
    pub fn load_path(&mut self, path: &Path) -> Result<(), LoadError> {
        let dataset = load_file(path)?;
        log::info!(
            "Loaded {} rows from {} ({} locations, years {:?})",
            dataset.len(),
            path.display(),
            dataset.locations.len(),
            dataset.years
        );
        self.set_dataset(dataset);
        Ok(())
    }

    /// Ingest a newly loaded dataset with every filter wide open.
    pub fn set_dataset(&mut self, dataset: SalesDataset) {
        self.selection = FilterSelection::all(&dataset);
        self.week_bounds = week_bounds(&dataset, &self.selection.years);
        self.products = ProductQuery::defaults(&dataset, &self.config);
        self.color_map = Some(ColorMap::new(&dataset.locations));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.recompute();
    }

    /// Rebuild the snapshot from the current selections.
    pub fn recompute(&mut self) {
        let Some(ds) = &self.dataset else {
            self.snapshot = None;
            return;
        };
        let snapshot = DashboardSnapshot::build(ds, &self.selection, &self.products, &self.config);
        match &snapshot {
            Ok(snap) => log::debug!(
                "recomputed dashboard: {} rows, revenue {:.2}",
                snap.row_count,
                snap.kpis.total_revenue
            ),
            Err(e) => log::warn!("dashboard blocked: {e}"),
        }
        self.snapshot = Some(snapshot);
    }

    // -- location filter --

    pub fn toggle_location(&mut self, location: &str) {
        if !self.selection.locations.remove(location) {
            self.selection.locations.insert(location.to_string());
        }
        self.recompute();
    }

    pub fn select_all_locations(&mut self) {
        if let Some(ds) = &self.dataset {
            self.selection.locations = ds.locations.iter().cloned().collect();
            self.recompute();
        }
    }

    pub fn select_no_locations(&mut self) {
        self.selection.locations.clear();
        self.recompute();
    }

    // -- year filter --

    /// Toggle a year and re-derive the week slider limits.  A range that
    /// spanned the old limits (or had none) follows the new full range; a
    /// narrowed range is clamped into the new limits.
    pub fn toggle_year(&mut self, year: i32) {
        if !self.selection.years.remove(&year) {
            self.selection.years.insert(year);
        }
        let previous = self.week_bounds;
        if let Some(ds) = &self.dataset {
            self.week_bounds = week_bounds(ds, &self.selection.years);
        }
        if let Some(bounds) = self.week_bounds {
            let spanned = previous.map_or(true, |p| p == self.selection.weeks);
            self.selection.weeks = if spanned {
                bounds
            } else {
                self.selection.weeks.clamp_to(bounds)
            };
        }
        self.recompute();
    }

    // -- week filter --

    pub fn set_week_range(&mut self, start: u8, end: u8) {
        let mut weeks = WeekRange::new(start, end);
        if let Some(bounds) = self.week_bounds {
            weeks = weeks.clamp_to(bounds);
        }
        if weeks != self.selection.weeks {
            self.selection.weeks = weeks;
            self.recompute();
        }
    }

    // -- product section --

    pub fn toggle_family(&mut self, family: &str) {
        if !self.products.families.remove(family) {
            self.products.families.insert(family.to_string());
        }
        self.recompute();
    }

    /// Add a product to the price lookups.  Refused once the configured
    /// maximum is reached; returns whether the product was added.
    pub fn add_price_product(&mut self, product: &str) -> bool {
        if self.products.products.iter().any(|p| p == product) {
            return false;
        }
        if self.products.products.len() >= self.config.max_price_lookups {
            self.status_message = Some(format!(
                "At most {} products can be compared",
                self.config.max_price_lookups
            ));
            return false;
        }
        self.products.products.push(product.to_string());
        self.status_message = None;
        self.recompute();
        true
    }

    pub fn remove_price_product(&mut self, product: &str) {
        self.products.products.retain(|p| p != product);
        self.status_message = None;
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::row;
    use crate::report::PricePanel;

    fn state() -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(SalesDataset::from_rows(vec![
            row("Valencia", 2019, 1, 10.0),
            row("Valencia", 2019, 52, 20.0),
            row("Pozuelo", 2020, 5, 5.0),
            row("Pozuelo", 2020, 32, 7.0),
        ]));
        state
    }

    fn revenue(state: &AppState) -> f64 {
        match &state.snapshot {
            Some(Ok(snap)) => snap.kpis.total_revenue,
            other => panic!("expected a snapshot, got {other:?}"),
        }
    }

    #[test]
    fn new_dataset_opens_every_filter() {
        let state = state();
        assert_eq!(state.selection.weeks, WeekRange::new(1, 52));
        assert_eq!(state.week_bounds, Some(WeekRange::new(1, 52)));
        assert_eq!(revenue(&state), 42.0);
    }

    #[test]
    fn year_change_reclamps_weeks() {
        let mut state = state();
        state.toggle_year(2019);
        assert_eq!(state.week_bounds, Some(WeekRange::new(5, 32)));
        assert_eq!(state.selection.weeks, WeekRange::new(5, 32));
        assert_eq!(revenue(&state), 12.0);

        state.set_week_range(1, 10);
        assert_eq!(state.selection.weeks, WeekRange::new(5, 10));
        assert_eq!(revenue(&state), 5.0);
    }

    #[test]
    fn reselecting_a_year_restores_the_full_week_range() {
        let mut state = state();
        state.toggle_year(2019);
        state.toggle_year(2019);
        assert_eq!(state.week_bounds, Some(WeekRange::new(1, 52)));
        assert_eq!(state.selection.weeks, WeekRange::new(1, 52));
        assert_eq!(revenue(&state), 42.0);
    }

    #[test]
    fn narrowed_week_range_survives_a_widening_year_change() {
        let mut state = state();
        state.toggle_year(2019);
        state.set_week_range(10, 32);
        state.toggle_year(2019);
        assert_eq!(state.week_bounds, Some(WeekRange::new(1, 52)));
        assert_eq!(state.selection.weeks, WeekRange::new(10, 32));
        assert_eq!(revenue(&state), 7.0);
    }

    #[test]
    fn deselecting_every_year_blocks_the_report() {
        let mut state = state();
        state.toggle_year(2019);
        state.toggle_year(2020);
        assert!(state.selection.years.is_empty());
        assert_eq!(state.snapshot, Some(Err(FilterError::NoYearSelected)));

        state.toggle_year(2020);
        assert_eq!(revenue(&state), 12.0);
    }

    #[test]
    fn no_location_means_no_revenue() {
        let mut state = state();
        state.select_no_locations();
        assert_eq!(revenue(&state), 0.0);
        state.toggle_location("Pozuelo");
        assert_eq!(revenue(&state), 12.0);
        state.select_all_locations();
        assert_eq!(revenue(&state), 42.0);
    }

    #[test]
    fn price_lookups_are_capped() {
        let mut state = state();
        assert_eq!(state.products.products, vec!["Pad Thai"]);
        assert!(state.add_price_product("Nasi Goreng"));
        assert!(!state.add_price_product("Ramen"));
        assert!(state.status_message.is_some());

        state.remove_price_product("Pad Thai");
        state.remove_price_product("Nasi Goreng");
        match &state.snapshot {
            Some(Ok(snap)) => assert_eq!(snap.prices, PricePanel::SelectProduct),
            other => panic!("expected a snapshot, got {other:?}"),
        }
    }
}
